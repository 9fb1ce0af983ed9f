pub mod twitch;
