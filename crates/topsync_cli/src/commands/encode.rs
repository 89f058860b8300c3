//! Encode command implementation.

use clap::Subcommand;
use topsync_protocol::Action;

/// Action to encode.
#[derive(Debug, Subcommand)]
pub enum EncodeAction {
    /// A field update
    Update {
        /// Field id
        #[arg(long)]
        id: String,
        /// New value
        #[arg(long, default_value = "")]
        value: String,
    },
    /// A button press
    Press {
        /// Button id
        #[arg(long)]
        id: String,
    },
}

impl From<EncodeAction> for Action {
    fn from(action: EncodeAction) -> Self {
        match action {
            EncodeAction::Update { id, value } => Action::update(id, value),
            EncodeAction::Press { id } => Action::press(id),
        }
    }
}

/// Runs the encode command.
pub fn run(action: EncodeAction) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", Action::from(action).encode()?);
    Ok(())
}
