pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::MapRequest;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_url, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "kegg-mapper")]
#[command(about = "Recover Pathway Map Image from a list of K0 and pathway name")]
pub struct CliConfig {
    #[arg(long = "K0file", visible_alias = "ko-file", help = "path to file which contains the K0 list.")]
    pub ko_file: String,

    #[arg(long, help = "absolute path for the created pathway map.")]
    pub out: String,

    #[arg(long, help = "color for KEGG orthologous groups.")]
    pub color: String,

    #[arg(long, help = "pathway name")]
    pub pathway: String,

    #[arg(long, help = "organism name.")]
    pub org: Option<String>,

    #[arg(long, help = "Path to a TOML service configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Override the KEGG base URL")]
    pub base_url: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn to_request(&self) -> MapRequest {
        MapRequest {
            ko_file: self.ko_file.clone(),
            output: self.out.clone(),
            color: self.color.clone(),
            pathway: self.pathway.clone(),
            organism: self.org.clone(),
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("K0file", &self.ko_file)?;
        validate_path("out", &self.out)?;
        validate_non_empty_string("color", &self.color)?;
        validate_non_empty_string("pathway", &self.pathway)?;
        if let Some(base_url) = &self.base_url {
            validate_url("base_url", base_url)?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
        }
        Ok(())
    }
}
