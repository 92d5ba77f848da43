use crate::core::ConfigProvider;
use crate::utils::error::{MapperError, Result};
use crate::utils::validation::{
    validate_absolute_path_prefix, validate_non_empty_string, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://www.kegg.jp";
pub const DEFAULT_FORM_PATH: &str = "/kegg/mapper/color.html";
pub const DEFAULT_LINK_PREFIX: &str = "/kegg-bin";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub form: FormSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub base_url: String,
    pub form_path: String,
    pub link_prefix: String,
    pub timeout_seconds: Option<u64>,
    pub user_agent: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            form_path: DEFAULT_FORM_PATH.to_string(),
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            timeout_seconds: None,
            user_agent: concat!("kegg-mapper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// 表單欄位名稱
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSection {
    pub identifiers_field: String,
    pub organism_field: String,
}

impl Default for FormSection {
    fn default() -> Self {
        Self {
            identifiers_field: "unclassified".to_string(),
            organism_field: "org".to_string(),
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MapperError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapperError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KEGG_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.service.base_url = url;
        }
        self
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.service.timeout_seconds.map(std::time::Duration::from_secs)
    }

    pub fn user_agent(&self) -> &str {
        &self.service.user_agent
    }
}

impl ConfigProvider for ServiceConfig {
    fn base_url(&self) -> &str {
        &self.service.base_url
    }

    fn form_path(&self) -> &str {
        &self.service.form_path
    }

    fn link_prefix(&self) -> &str {
        &self.service.link_prefix
    }

    fn identifiers_field(&self) -> &str {
        &self.form.identifiers_field
    }

    fn organism_field(&self) -> &str {
        &self.form.organism_field
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_url("service.base_url", &self.service.base_url)?;
        validate_absolute_path_prefix("service.form_path", &self.service.form_path)?;
        validate_absolute_path_prefix("service.link_prefix", &self.service.link_prefix)?;
        validate_non_empty_string("form.identifiers_field", &self.form.identifiers_field)?;
        validate_non_empty_string("form.organism_field", &self.form.organism_field)?;

        if self.service.timeout_seconds == Some(0) {
            return Err(MapperError::InvalidConfigValueError {
                field: "service.timeout_seconds".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}
