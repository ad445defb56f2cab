//! Terminal configuration.
//!
//! Power-on settings of the terminal, persisted as TOML. The default
//! location is `~/.serterm/config.toml`:
//!
//! ```toml
//! baud_rate = 115200
//! word_length = 8
//! stop_bits = 1
//! parity = "none"
//!
//! charset = "utf8"          # ascii, utf8
//! receive_c1_mode = "8bit"  # 7bit, 8bit
//! transmit_c1_mode = "7bit"
//!
//! auto_wrap_mode = true
//! new_line_mode = false
//! ansi_mode = true          # false starts in VT52 mode
//! start_up = "message"      # none, message
//! flow_control = true
//!
//! [report]
//! parity = 1
//! nbits = 1
//! xspeed = 128
//! rspeed = 128
//! clkmul = 1
//! flags = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Baud rates the UART can be configured with
pub const BAUD_RATES: [u32; 14] = [
    110, 150, 300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unsupported baud rate: {0}")]
    InvalidBaudRate(u32),

    #[error("Unsupported framing: {0}")]
    InvalidFraming(String),

    #[error("Invalid DECREQTPARM report field: {0}")]
    InvalidReport(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Input decoding of the receive path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    Ascii,
    #[default]
    Utf8,
}

/// 7-bit (`ESC x`) or 8-bit (single byte) C1 controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum C1Mode {
    #[default]
    #[serde(rename = "7bit")]
    Bit7,
    #[serde(rename = "8bit")]
    Bit8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// What the terminal shows after `init`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartUp {
    None,
    #[default]
    Message,
}

/// Fields reported by DECREQTPARM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 1 none, 4 odd, 5 even
    pub parity: u16,
    /// 1 = 8 bits, 2 = 7 bits
    pub nbits: u16,
    pub xspeed: u16,
    pub rspeed: u16,
    pub clkmul: u16,
    pub flags: u16,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            parity: 1,
            nbits: 1,
            xspeed: 128,
            rspeed: 128,
            clkmul: 1,
            flags: 0,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub baud_rate: u32,
    pub word_length: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    pub charset: Charset,
    pub receive_c1_mode: C1Mode,
    pub transmit_c1_mode: C1Mode,
    pub auto_wrap_mode: bool,
    pub screen_mode: bool,
    pub send_receive_mode: bool,
    pub new_line_mode: bool,
    pub cursor_key_mode: bool,
    pub auto_repeat_mode: bool,
    pub ansi_mode: bool,
    pub backspace_mode: bool,
    pub start_up: StartUp,
    pub flow_control: bool,
    pub report: ReportConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            word_length: 8,
            stop_bits: 1,
            parity: Parity::None,
            charset: Charset::Utf8,
            receive_c1_mode: C1Mode::Bit8,
            transmit_c1_mode: C1Mode::Bit7,
            auto_wrap_mode: true,
            screen_mode: false,
            send_receive_mode: true,
            new_line_mode: false,
            cursor_key_mode: false,
            auto_repeat_mode: true,
            ansi_mode: true,
            backspace_mode: false,
            start_up: StartUp::Message,
            flow_control: true,
            report: ReportConfig::default(),
        }
    }
}

impl TerminalConfig {
    /// Load and validate configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or unusable
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !BAUD_RATES.contains(&self.baud_rate) {
            return Err(ConfigError::InvalidBaudRate(self.baud_rate));
        }
        if !matches!(self.word_length, 8 | 9) {
            return Err(ConfigError::InvalidFraming(format!(
                "word_length = {}",
                self.word_length
            )));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            return Err(ConfigError::InvalidFraming(format!(
                "stop_bits = {}",
                self.stop_bits
            )));
        }

        let report = &self.report;
        if !matches!(report.parity, 1 | 4 | 5) {
            return Err(ConfigError::InvalidReport(format!("parity = {}", report.parity)));
        }
        if !matches!(report.nbits, 1 | 2) {
            return Err(ConfigError::InvalidReport(format!("nbits = {}", report.nbits)));
        }
        Ok(())
    }

    /// `~/.serterm/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".serterm").join("config.toml"))
    }
}

// Get home directory
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
