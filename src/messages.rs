//! User-facing message catalog

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Language used for alerts and prompts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    En,
    ZhCn,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::ZhCn => write!(f, "zh-cn"),
        }
    }
}

/// Localized texts shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    #[must_use]
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub fn unsupported_type(&self) -> String {
        match self.locale {
            Locale::En => "Please upload an image file (JPG, PNG)".to_string(),
            Locale::ZhCn => "请上传图片文件 (JPG, PNG)".to_string(),
        }
    }

    #[must_use]
    pub fn too_large(&self, limit_bytes: u64) -> String {
        let limit = format_megabytes(limit_bytes);
        match self.locale {
            Locale::En => format!("Image size cannot exceed {limit}"),
            Locale::ZhCn => format!("图片大小不能超过 {limit}"),
        }
    }

    /// Alert text for a rejected file
    #[must_use]
    pub fn validation(&self, error: &ValidationError) -> String {
        match error {
            ValidationError::UnsupportedType { .. } => self.unsupported_type(),
            ValidationError::TooLarge { limit, .. } => self.too_large(*limit),
        }
    }

    #[must_use]
    pub fn upload_failed(&self) -> String {
        match self.locale {
            Locale::En => "Upload or processing failed, please try again".to_string(),
            Locale::ZhCn => "上传或处理失败，请重试".to_string(),
        }
    }

    #[must_use]
    pub fn busy(&self) -> String {
        match self.locale {
            Locale::En => "Another photo is still being processed, please wait".to_string(),
            Locale::ZhCn => "正在处理上一张图片，请稍候".to_string(),
        }
    }

    /// Question asked before switching to mock mode after a remote failure
    #[must_use]
    pub fn fallback_question(&self, reason: &str) -> String {
        match self.locale {
            Locale::En => format!(
                "Background removal failed: {reason}\n\nSwitch to mock mode (shows the original image only) and continue?"
            ),
            Locale::ZhCn => {
                format!("AI 抠图失败: {reason}\n\n是否切换到模拟模式（仅显示原图）继续？")
            },
        }
    }

    /// Placeholder reason when a failure has no message
    #[must_use]
    pub fn unknown_error(&self) -> String {
        match self.locale {
            Locale::En => "Unknown error".to_string(),
            Locale::ZhCn => "未知错误".to_string(),
        }
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

/// Render a byte count as whole megabytes when exact, e.g. `10MB`
fn format_megabytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    }
}
