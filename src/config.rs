use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stereo: StereoConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// ステレオカメラペアのパラメータ
///
/// 左カメラの内部パラメータと基線長。平行ステレオを仮定し、
/// 左右で同一の内部パラメータを使う。
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StereoConfig {
    /// 焦点距離X（ピクセル）
    #[serde(default = "default_fx")]
    pub fx: f32,
    /// 焦点距離Y（ピクセル）
    #[serde(default = "default_fy")]
    pub fy: f32,
    /// 主点X（ピクセル）
    #[serde(default = "default_cx")]
    pub cx: f32,
    /// 主点Y（ピクセル）
    #[serde(default = "default_cy")]
    pub cy: f32,
    /// カメラ間距離（ミリメートル）
    #[serde(default = "default_baseline")]
    pub baseline_mm: f32,
}

fn default_fx() -> f32 { 640.0 }
fn default_fy() -> f32 { 640.0 }
fn default_cx() -> f32 { 320.0 }
fn default_cy() -> f32 { 240.0 }
fn default_baseline() -> f32 { 100.0 }

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            fx: default_fx(),
            fy: default_fy(),
            cx: default_cx(),
            cy: default_cy(),
            baseline_mm: default_baseline(),
        }
    }
}

/// BVHエクスポート設定
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ExportConfig {
    /// モーションのフレームレート
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// 3D座標の除数（100でミリメートル→センチメートル）
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_fps() -> u32 { 30 }
fn default_scale() -> f32 { 100.0 }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            scale: default_scale(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルがなければデフォルト設定を返す。
    /// ファイルはあるが読めない場合は警告してデフォルトに落とす。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                if path.as_ref().exists() {
                    log::warn!("config ignored ({err:#}), using defaults");
                } else {
                    log::debug!("config not found, using defaults");
                }
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stereo_config() {
        let config = StereoConfig::default();
        assert_eq!(config.fx, 640.0);
        assert_eq!(config.fy, 640.0);
        assert_eq!(config.cx, 320.0);
        assert_eq!(config.cy, 240.0);
        assert_eq!(config.baseline_mm, 100.0);
    }

    #[test]
    fn test_default_export_config() {
        let config = ExportConfig::default();
        assert_eq!(config.fps, 30);
        assert_eq!(config.scale, 100.0);
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.stereo.baseline_mm, 100.0);
        assert_eq!(config.export.fps, 30);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
[stereo]
baseline_mm = 65.0

[export]
fps = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        // 指定フィールドのみ上書き
        assert_eq!(config.stereo.baseline_mm, 65.0);
        assert_eq!(config.stereo.fx, 640.0);
        assert_eq!(config.export.fps, 60);
        assert_eq!(config.export.scale, 100.0);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("nonexistent_config.toml");
        assert_eq!(config.stereo.fx, 640.0);
    }

    #[test]
    fn test_load_or_default_broken_file() {
        let path = std::env::temp_dir().join("mocap_core_broken_config.toml");
        fs::write(&path, "[stereo\nfx =").unwrap();
        let config = Config::load_or_default(&path);
        let _ = fs::remove_file(&path);
        // 壊れた設定は無視してデフォルト
        assert_eq!(config.stereo.fx, 640.0);
        assert_eq!(config.export.fps, 30);
    }
}
