//! First-run setup: load each setting if present, otherwise prompt once and
//! persist the answer.

use std::future::Future;

use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

use crate::core::{HotkeyBinding, Mode, Settings};
use crate::error::AppError;
use crate::input::KeySource;

use super::ConfigStore;

const MODE_MENU: &str = "Select mode:\n\
    1. Toggle (Press once to disable, press again to enable)\n\
    2. Hold (Hold key to disable, release to enable)";

const INVALID_MODE_ACK: &str =
    "Invalid input. Please enter only '1' or '2'. Press Enter to close the script.";

/// The interactive side of setup.
pub trait Prompter {
    /// Block until the user presses a key; returns its name.
    fn capture_hotkey(&mut self) -> impl Future<Output = Result<String, AppError>>;

    /// Read one line of input for the mode menu.
    fn read_mode_choice(&mut self) -> impl Future<Output = Result<String, AppError>>;

    /// Show `message` and wait for the user to confirm.
    fn acknowledge(&mut self, message: &str) -> impl Future<Output = ()>;

    fn say(&mut self, line: &str);
}

/// Load both settings, prompting for whichever is missing or invalid.
pub async fn load_or_setup<P: Prompter>(
    store: &ConfigStore,
    prompter: &mut P,
) -> Result<Settings, AppError> {
    let hotkey = load_or_prompt_hotkey(store, prompter).await?;
    let mode = load_or_prompt_mode(store, prompter).await?;
    Ok(Settings { hotkey, mode })
}

async fn load_or_prompt_hotkey<P: Prompter>(
    store: &ConfigStore,
    prompter: &mut P,
) -> Result<HotkeyBinding, AppError> {
    match store.load_hotkey() {
        Ok(binding) => {
            prompter.say(&format!("Loaded hotkey: '{binding}'"));
            return Ok(binding);
        }
        Err(e) => tracing::info!("No usable hotkey: {e}"),
    }

    let path = store.hotkey_path();
    prompter.say(&format!(
        "Configuration file '{}' not found. Starting setup...",
        path.display()
    ));
    prompter.say("Press the key you want to use as a bind (e.g., 'f10', 'space')...");

    let key = prompter.capture_hotkey().await?;
    let binding = HotkeyBinding::parse(&key)
        .ok_or_else(|| AppError::Input(format!("captured key {key:?} has no usable name")))?;
    store.save_hotkey(&binding)?;

    prompter.say(&format!("Hot key set to: '{binding}'"));
    prompter.say(&format!(
        "To change the hotkey, delete the '{}' file and run again.",
        path.display()
    ));
    Ok(binding)
}

async fn load_or_prompt_mode<P: Prompter>(
    store: &ConfigStore,
    prompter: &mut P,
) -> Result<Mode, AppError> {
    match store.load_mode() {
        Ok(mode) => {
            prompter.say(&format!("Loaded mode: {} ({mode})", mode.as_choice()));
            return Ok(mode);
        }
        Err(e) => tracing::info!("No usable mode: {e}"),
    }

    let path = store.mode_path();
    prompter.say(&format!(
        "Configuration file '{}' not found. Starting setup...",
        path.display()
    ));
    prompter.say(MODE_MENU);

    let choice = prompter.read_mode_choice().await?;
    let Some(mode) = Mode::from_choice(&choice) else {
        prompter.acknowledge(INVALID_MODE_ACK).await;
        return Err(AppError::InvalidInput(format!(
            "invalid mode selection {:?}",
            choice.trim()
        )));
    };
    store.save_mode(mode)?;

    prompter.say(&format!("Mode set to: {mode}"));
    prompter.say(&format!(
        "To change the mode, delete the '{}' file and run again.",
        path.display()
    ));
    Ok(mode)
}

/// Console prompts backed by the hotkey listener and stdin.
pub struct ConsolePrompt<'a, K> {
    keys: &'a mut K,
    stdin: BufReader<Stdin>,
}

impl<'a, K: KeySource> ConsolePrompt<'a, K> {
    pub fn new(keys: &'a mut K) -> Self {
        Self {
            keys,
            stdin: BufReader::new(tokio::io::stdin()),
        }
    }

    async fn read_line(&mut self) -> Result<String, AppError> {
        let mut line = String::new();
        let read = self.stdin.read_line(&mut line).await?;
        if read == 0 {
            return Err(AppError::Io("standard input closed".into()));
        }
        Ok(line.trim().to_string())
    }
}

impl<K: KeySource> Prompter for ConsolePrompt<'_, K> {
    async fn capture_hotkey(&mut self) -> Result<String, AppError> {
        // Drop anything typed before the prompt appeared.
        while self.keys.try_next_press().is_some() {}
        self.keys
            .next_press()
            .await
            .ok_or_else(|| AppError::Input("hotkey listener stopped during setup".into()))
    }

    async fn read_mode_choice(&mut self) -> Result<String, AppError> {
        self.read_line().await
    }

    async fn acknowledge(&mut self, message: &str) {
        println!("{message}");
        if let Err(e) = self.read_line().await {
            tracing::debug!("Acknowledgement not read: {e}");
        }
    }

    fn say(&mut self, line: &str) {
        println!("{line}");
    }
}
