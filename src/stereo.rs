use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::StereoConfig;
use crate::landmark::{Landmark, LandmarkIndex};

/// 左右ペアリングの可視性閾値
const VISIBILITY_THRESHOLD: f32 = 0.5;
/// 視差の最小値（ピクセル）。これ未満は深度が発散するため破棄
const MIN_DISPARITY: f32 = 1.0;
/// 三角測量直後の粗い深度ゲート（ミリメートル）
const MIN_DEPTH_MM: f32 = 10.0;
const MAX_DEPTH_MM: f32 = 5000.0;
/// フィルタ段の深度ゲート（ミリメートル）
const FILTER_MIN_DEPTH_MM: f32 = 50.0;
const FILTER_MAX_DEPTH_MM: f32 = 3000.0;
/// フィルタ段の信頼度閾値
const FILTER_MIN_CONFIDENCE: f32 = 0.7;
/// IQR外れ値除去の係数
const IQR_MULTIPLIER: f32 = 1.5;
/// この点数を超えたらIQR外れ値除去を適用
const IQR_MIN_POINTS: usize = 4;
/// 統計で「有効」とみなす信頼度
const STATS_VALID_CONFIDENCE: f32 = 0.8;

/// 左右カメラで対応づいたランドマークペア
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub index: LandmarkIndex,
    pub left: Landmark,
    pub right: Landmark,
    /// 左右可視性の小さい方
    pub confidence: f32,
}

/// 三角測量された3D点（カメラ座標、ミリメートル）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub keypoint: LandmarkIndex,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub confidence: f32,
    /// 三角測量時の視差（ピクセル）
    pub disparity: f32,
}

/// 同一インデックスのランドマークを左右でペアリング
///
/// 両方の可視性が閾値を超えるペアのみ採用。入力長が異なる場合や
/// 17点を超える場合は短い方/17点までで打ち切る。
pub fn match_landmarks(left: &[Landmark], right: &[Landmark]) -> Vec<MatchedPair> {
    let len = left.len().min(right.len()).min(LandmarkIndex::COUNT);
    let mut pairs = Vec::with_capacity(len);

    for i in 0..len {
        let (lm_left, lm_right) = (&left[i], &right[i]);
        if !lm_left.is_visible(VISIBILITY_THRESHOLD) || !lm_right.is_visible(VISIBILITY_THRESHOLD)
        {
            continue;
        }
        if let Some(index) = LandmarkIndex::from_index(i) {
            pairs.push(MatchedPair {
                index,
                left: *lm_left,
                right: *lm_right,
                confidence: lm_left.visibility.min(lm_right.visibility),
            });
        }
    }

    pairs
}

/// 深度統計
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthStats {
    pub total_points: usize,
    /// 平均深度（ミリメートル）
    pub avg_depth: f32,
    pub min_depth: f32,
    pub max_depth: f32,
    pub avg_confidence: f32,
    /// 信頼度0.8超の点数
    pub valid_points: usize,
}

/// 3D点列の深度統計を計算。空入力はゼロ統計。
pub fn depth_stats(points: &[Point3D]) -> DepthStats {
    if points.is_empty() {
        return DepthStats::default();
    }

    let mut depth_sum = 0.0f32;
    let mut conf_sum = 0.0f32;
    let mut min_depth = f32::INFINITY;
    let mut max_depth = f32::NEG_INFINITY;
    let mut valid_points = 0;

    for point in points {
        depth_sum += point.z;
        conf_sum += point.confidence;
        min_depth = min_depth.min(point.z);
        max_depth = max_depth.max(point.z);
        if point.confidence > STATS_VALID_CONFIDENCE {
            valid_points += 1;
        }
    }

    let n = points.len() as f32;
    DepthStats {
        total_points: points.len(),
        avg_depth: depth_sum / n,
        min_depth,
        max_depth,
        avg_confidence: conf_sum / n,
        valid_points,
    }
}

/// 1回の復元パスの結果
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// フィルタ済み3D点
    pub points: Vec<Point3D>,
    /// ペアリングされたランドマーク数
    pub matches: usize,
    /// フィルタ前の三角測量点数
    pub raw_points: usize,
    pub stats: DepthStats,
    pub timestamp_ms: u64,
}

/// 視差ベースのステレオ3D復元
///
/// 平行ステレオ（左右カメラが同一平面・光軸平行）を仮定し、
/// 視差から深度を直接計算する。セッションごとに構築して使う。
#[derive(Debug, Clone)]
pub struct StereoReconstructor {
    config: StereoConfig,
}

impl StereoReconstructor {
    pub fn new(config: StereoConfig) -> Self {
        Self { config }
    }

    /// ペア列を三角測量して3D点列に変換
    ///
    /// 視差が小さすぎる点、深度が粗ゲート外の点は黙って除外する。
    /// 点単位の除外でバッチ全体は失敗しない。
    pub fn triangulate(
        &self,
        pairs: &[MatchedPair],
        image_width: u32,
        image_height: u32,
    ) -> Vec<Point3D> {
        let StereoConfig { fx, fy, cx, cy, baseline_mm } = self.config;
        let mut points = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let (lx, ly) = pair.left.to_pixel(image_width, image_height);
            let (rx, _) = pair.right.to_pixel(image_width, image_height);

            let disparity = lx - rx;
            if disparity.abs() < MIN_DISPARITY {
                log::debug!(
                    "{:?}: disparity {:.2}px below minimum, skipping",
                    pair.index,
                    disparity
                );
                continue;
            }

            let z = fx * baseline_mm / disparity;
            if z <= MIN_DEPTH_MM || z >= MAX_DEPTH_MM {
                log::debug!("{:?}: depth {:.1}mm out of range, skipping", pair.index, z);
                continue;
            }

            let x = (lx - cx) * z / fx;
            let y = (ly - cy) * z / fy;

            points.push(Point3D {
                keypoint: pair.index,
                x,
                y,
                z,
                confidence: pair.confidence,
                disparity,
            });
        }

        points
    }

    /// 信頼度・深度ゲートとIQR外れ値除去
    ///
    /// 1. 信頼度 > 0.7 かつ 50mm < z < 3000mm の点を残す
    /// 2. 残りが4点を超える場合、深度のIQR範囲外を除去
    pub fn filter_and_smooth(&self, points: &[Point3D]) -> Vec<Point3D> {
        let valid: Vec<Point3D> = points
            .iter()
            .filter(|p| {
                p.confidence > FILTER_MIN_CONFIDENCE
                    && p.z > FILTER_MIN_DEPTH_MM
                    && p.z < FILTER_MAX_DEPTH_MM
            })
            .copied()
            .collect();

        if valid.len() <= IQR_MIN_POINTS {
            return valid;
        }

        let mut depths: Vec<f32> = valid.iter().map(|p| p.z).collect();
        depths.sort_by(f32::total_cmp);

        let q1 = depths[(depths.len() as f32 * 0.25) as usize];
        let q3 = depths[(depths.len() as f32 * 0.75) as usize];
        let iqr = q3 - q1;
        let low = q1 - IQR_MULTIPLIER * iqr;
        let high = q3 + IQR_MULTIPLIER * iqr;

        let filtered: Vec<Point3D> = valid
            .iter()
            .filter(|p| p.z >= low && p.z <= high)
            .copied()
            .collect();

        if filtered.len() < valid.len() {
            log::debug!(
                "IQR filter removed {} of {} points",
                valid.len() - filtered.len(),
                valid.len()
            );
        }

        filtered
    }

    /// ペアリング→三角測量→フィルタ→統計の全パイプライン
    ///
    /// 失敗しない。空入力は空の点列とゼロ統計を返す。
    pub fn reconstruct(
        &self,
        left: &[Landmark],
        right: &[Landmark],
        image_width: u32,
        image_height: u32,
    ) -> Reconstruction {
        let matched = match_landmarks(left, right);
        let raw = self.triangulate(&matched, image_width, image_height);
        let points = self.filter_and_smooth(&raw);
        let stats = depth_stats(&points);

        Reconstruction {
            matches: matched.len(),
            raw_points: raw.len(),
            points,
            stats,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
