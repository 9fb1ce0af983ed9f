use crate::error::{CliError, Result};
use inquire::Select;

/// Ask the user to pick one of `options`, returning its index.
///
/// A single option is picked without prompting.
pub fn select_index(prompt: &str, options: Vec<String>) -> Result<usize> {
    match options.len() {
        0 => Err(CliError::NoOptions),
        1 => Ok(0),
        _ => {
            let choice = Select::new(prompt, options)
                .with_page_size(20)
                .with_help_message("↑↓ to move, type to filter, enter to play, esc to quit")
                .raw_prompt()?;
            Ok(choice.index)
        }
    }
}
