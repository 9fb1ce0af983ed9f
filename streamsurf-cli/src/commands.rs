use crate::{
    cli::OutputFormat,
    config::{AppConfig, SourceChoice},
    error::{CliError, Result},
    menu::select_index,
    output::{OutputManager, write_output},
    player::{PlayRequest, Player, prompt_start_time},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use streamsurf_platforms::{Twitch, TwitchGql, TwitchPage, default_client};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use vod_cache::{
    BatchReport, CacheConfig, ChannelReport, LiveStatusFetcher, QueryCoordinator, SharedCache,
    Video, VodFetcher, sort_by_latest,
};

pub struct CommandExecutor {
    config: AppConfig,
    cache_config: CacheConfig,
    channels: Vec<String>,
    output: OutputManager,
    player: Player,
    show_progress: bool,
}

impl CommandExecutor {
    /// Fails when the cache cannot hold a page for every followed channel;
    /// nothing may be queried in that case.
    pub fn new(
        config: AppConfig,
        channels: Vec<String>,
        colored: bool,
        show_progress: bool,
    ) -> Result<Self> {
        let channel_count = channels.len().max(1);
        let cache_config = config.cache_config(channel_count);
        cache_config.validate(channel_count)?;

        Ok(Self {
            player: Player::from_config(&config),
            output: OutputManager::new(colored),
            config,
            cache_config,
            channels,
            show_progress,
        })
    }

    fn build_coordinator(&self) -> Result<QueryCoordinator> {
        let cache = SharedCache::from_config(&self.cache_config)?;
        let client = default_client(self.config.timeout())?;
        let mut twitch = Twitch::new(client, self.cache_config.page_size);
        if let Some(token) = &self.config.oauth_token {
            twitch = twitch.with_oauth_token(token);
        }
        if let Some(cookies) = &self.config.cookies {
            twitch = twitch.with_cookies(cookies);
        }

        // Both roles use the same GraphQL instance so one POST answers them.
        let gql = TwitchGql::new(twitch.clone());
        let vod_fetcher: Arc<dyn VodFetcher> = match self.config.vod_source {
            SourceChoice::Gql => Arc::new(gql.clone()),
            SourceChoice::Page => Arc::new(TwitchPage::new(twitch.clone())),
        };
        let live_fetcher: Arc<dyn LiveStatusFetcher> = match self.config.live_source {
            SourceChoice::Gql => Arc::new(gql),
            SourceChoice::Page => Arc::new(TwitchPage::new(twitch)),
        };
        info!(
            vods = vod_fetcher.name(),
            live = live_fetcher.name(),
            capacity = self.cache_config.ring_capacity,
            "Sources ready"
        );

        Ok(QueryCoordinator::new(
            cache,
            vod_fetcher,
            live_fetcher,
            &self.cache_config,
        ))
    }

    fn spinner(&self, message: String) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_strings(&[
                "▹▹▹▹▹",
                "▸▹▹▹▹",
                "▹▸▹▹▹",
                "▹▹▸▹▹",
                "▹▹▹▸▹",
                "▹▹▹▹▸",
                "▪▪▪▪▪",
            ]));
        }
        pb.set_message(message);
        pb
    }

    async fn query_all(&self, coordinator: &QueryCoordinator) -> Result<BatchReport> {
        if self.channels.is_empty() {
            return Err(CliError::NoChannels);
        }
        let pb = self.spinner(format!("Querying {} channels...", self.channels.len()));
        let report = coordinator.query_channels(self.channels.iter()).await;
        pb.finish_and_clear();

        self.print_warnings(&report);
        Ok(report)
    }

    async fn query_one(&self, coordinator: &QueryCoordinator, channel: &str) -> ChannelReport {
        let pb = self.spinner(format!("Querying {channel}..."));
        let report = coordinator.query_channel(channel).await;
        pb.finish_and_clear();

        let mut batch = BatchReport::new();
        batch.push(report.clone());
        self.print_warnings(&batch);
        report
    }

    fn print_warnings(&self, report: &BatchReport) {
        for line in self.output.format_report_warnings(report) {
            eprintln!("{line}");
        }
    }

    pub async fn follow(&self, list: bool, format: OutputFormat) -> Result<()> {
        let coordinator = self.build_coordinator()?;
        self.query_all(&coordinator).await?;
        let videos = coordinator.cache().follow_view(&self.channels);

        if list {
            return write_output(&self.output.format_videos(&videos, format)?);
        }

        let options = videos.iter().map(|v| self.output.format_line(v)).collect();
        let index = select_index("Follow list", options)?;
        self.play(&videos[index]).await
    }

    pub async fn vods(&self, channel: &str, list: bool, format: OutputFormat) -> Result<()> {
        let channel = Twitch::normalize_channel(channel)?;
        let coordinator = self.build_coordinator()?;
        self.query_one(&coordinator, &channel).await;
        let videos = coordinator.cache().channel_window(&channel);

        if list {
            return write_output(&self.output.format_videos(&videos, format)?);
        }

        let options = videos.iter().map(|v| self.output.format_line(v)).collect();
        let index = select_index(&format!("VODs for {channel}"), options)?;
        self.play(&videos[index]).await
    }

    pub async fn open(&self, channel: &str) -> Result<()> {
        let channel = Twitch::normalize_channel(channel)?;
        let coordinator = self.build_coordinator()?;
        self.query_one(&coordinator, &channel).await;

        let video = coordinator
            .cache()
            .latest_for_channel(&channel)
            .ok_or(CliError::NothingForChannel(channel))?;
        self.play(&video).await
    }

    /// Re-query every channel each `interval` and reprint the follow list,
    /// live channels first, until Ctrl-C.
    pub async fn watch(&self, interval: Duration) -> Result<()> {
        let coordinator = self.build_coordinator()?;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result?;
                    info!("Interrupted, stopping watch");
                    return Ok(());
                }
                result = async {
                    ticker.tick().await;
                    self.refresh_follow_view(&coordinator).await
                } => result?,
            }
        }
    }

    async fn refresh_follow_view(&self, coordinator: &QueryCoordinator) -> Result<()> {
        self.query_all(coordinator).await?;
        let mut videos = coordinator.cache().follow_view(&self.channels);
        sort_by_latest(&mut videos);

        let mut content = format!(
            "{}\n",
            self.output.header(&format!(
                "Follow list (updated {})",
                chrono::Local::now().format("%H:%M:%S")
            ))
        );
        content.push_str(&self.output.format_videos(&videos, OutputFormat::Pretty)?);
        write_output(&content)
    }

    async fn play(&self, video: &Video) -> Result<()> {
        eprintln!("{}", self.output.format_line(video));
        if video.is_offline() {
            warn!(channel = %video.channel, "Channel is offline and has no cached VODs");
            return Err(CliError::NothingForChannel(video.channel.clone()));
        }
        let start_time = prompt_start_time(video)?;
        let request = PlayRequest::new(video, &start_time)?;
        self.player.play(&request).await
    }
}
