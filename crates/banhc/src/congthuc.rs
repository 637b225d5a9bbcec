use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Không thể đọc 'congthuc.toml': {0}")]
    Io(#[from] std::io::Error),
    #[error("Không thể tải 'congthuc.toml': {0}")]
    Parse(#[from] toml::de::Error),
}

/// The build recipe, `congthuc.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CongThuc {
    pub goi: Goi,
    pub phuthuoc: PhuThuoc,
    pub bandung: BanDung,
}

/// `[goi]` — package metadata.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Goi {
    pub ten: String,
    pub ban: String,
    pub tacgia: Vec<String>,
}

/// `[phuthuoc]` — dependencies, reserved.
#[derive(Debug, Default, Deserialize)]
pub struct PhuThuoc {}

/// `[bandung]` — entry point and output path.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BanDung {
    pub diemvao: String,
    pub xuat: String,
}

impl CongThuc {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
