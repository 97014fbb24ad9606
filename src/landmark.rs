use serde::{Deserialize, Serialize};

/// MediaPipe Pose 33点のうち追跡対象とする17点のインデックス
///
/// 列挙子の値はフィルタ後配列内の位置 (0〜16)。
/// 元モデルのランドマーク番号は provider_index() で取得する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftShoulder = 1,
    RightShoulder = 2,
    LeftElbow = 3,
    RightElbow = 4,
    LeftWrist = 5,
    RightWrist = 6,
    LeftHip = 7,
    RightHip = 8,
    LeftKnee = 9,
    RightKnee = 10,
    LeftAnkle = 11,
    RightAnkle = 12,
    LeftHeel = 13,
    RightHeel = 14,
    LeftFootIndex = 15,
    RightFootIndex = 16,
}

impl LandmarkIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftShoulder),
            2 => Some(Self::RightShoulder),
            3 => Some(Self::LeftElbow),
            4 => Some(Self::RightElbow),
            5 => Some(Self::LeftWrist),
            6 => Some(Self::RightWrist),
            7 => Some(Self::LeftHip),
            8 => Some(Self::RightHip),
            9 => Some(Self::LeftKnee),
            10 => Some(Self::RightKnee),
            11 => Some(Self::LeftAnkle),
            12 => Some(Self::RightAnkle),
            13 => Some(Self::LeftHeel),
            14 => Some(Self::RightHeel),
            15 => Some(Self::LeftFootIndex),
            16 => Some(Self::RightFootIndex),
            _ => None,
        }
    }

    /// MediaPipe Pose 33点モデルでのランドマーク番号
    pub fn provider_index(self) -> usize {
        match self {
            Self::Nose => 0,
            Self::LeftShoulder => 11,
            Self::RightShoulder => 12,
            Self::LeftElbow => 13,
            Self::RightElbow => 14,
            Self::LeftWrist => 15,
            Self::RightWrist => 16,
            Self::LeftHip => 23,
            Self::RightHip => 24,
            Self::LeftKnee => 25,
            Self::RightKnee => 26,
            Self::LeftAnkle => 27,
            Self::RightAnkle => 28,
            Self::LeftHeel => 29,
            Self::RightHeel => 30,
            Self::LeftFootIndex => 31,
            Self::RightFootIndex => 32,
        }
    }

    /// 33点モデルのランドマーク番号から変換（追跡対象外はNone）
    pub fn from_provider_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            11 => Some(Self::LeftShoulder),
            12 => Some(Self::RightShoulder),
            13 => Some(Self::LeftElbow),
            14 => Some(Self::RightElbow),
            15 => Some(Self::LeftWrist),
            16 => Some(Self::RightWrist),
            23 => Some(Self::LeftHip),
            24 => Some(Self::RightHip),
            25 => Some(Self::LeftKnee),
            26 => Some(Self::RightKnee),
            27 => Some(Self::LeftAnkle),
            28 => Some(Self::RightAnkle),
            29 => Some(Self::LeftHeel),
            30 => Some(Self::RightHeel),
            31 => Some(Self::LeftFootIndex),
            32 => Some(Self::RightFootIndex),
            _ => None,
        }
    }
}

/// 単一ランドマークサンプル
///
/// 2D検出では (x, y) は正規化画像座標 (0.0〜1.0)、
/// ワールド座標では腰中心のメートル単位。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// 可視性スコア (0.0〜1.0)。0.0は欠損扱い。
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    pub fn new_3d(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視性が閾値を超えているか
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    /// 正規化座標をピクセル座標に変換
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

/// 記録された1フレーム分のランドマーク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 壁時計タイムスタンプ（ミリ秒、単調非減少）
    pub timestamp_ms: u64,
    /// バッファ内位置（0始まり）
    pub frame_number: u32,
    /// 記録開始からの経過秒
    pub frame_time: f32,
    /// 2D検出ランドマーク（正規化画像座標）
    pub landmarks_2d: [Landmark; LandmarkIndex::COUNT],
    /// ワールド座標ランドマーク（メートル）
    pub landmarks_3d: [Landmark; LandmarkIndex::COUNT],
    /// ランドマークごとの信頼度
    pub confidence: [f32; LandmarkIndex::COUNT],
}

impl Frame {
    /// インデックスでワールド座標ランドマークを取得
    pub fn landmark_3d(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks_3d[index as usize]
    }

    /// フレーム単位の統計サマリ
    pub fn summary(&self) -> FrameSummary {
        let n = LandmarkIndex::COUNT as f32;
        let avg_depth_mm =
            self.landmarks_3d.iter().map(|lm| lm.z).sum::<f32>() / n * 1000.0;
        let avg_confidence = self.confidence.iter().sum::<f32>() / n;
        let valid_points = self.confidence.iter().filter(|&&c| c > 0.7).count();
        FrameSummary {
            total_points: LandmarkIndex::COUNT,
            avg_depth_mm,
            avg_confidence,
            valid_points,
        }
    }
}

/// エクスポート診断用のフレーム統計
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub total_points: usize,
    /// ワールドz座標の平均（ミリメートル換算）
    pub avg_depth_mm: f32,
    pub avg_confidence: f32,
    /// 信頼度0.7超のランドマーク数
    pub valid_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 17);
    }

    #[test]
    fn test_landmark_index_from_index() {
        assert_eq!(LandmarkIndex::from_index(0), Some(LandmarkIndex::Nose));
        assert_eq!(
            LandmarkIndex::from_index(16),
            Some(LandmarkIndex::RightFootIndex)
        );
        assert_eq!(LandmarkIndex::from_index(17), None);
    }

    #[test]
    fn test_provider_index_roundtrip() {
        for i in 0..LandmarkIndex::COUNT {
            let lm = LandmarkIndex::from_index(i).unwrap();
            assert_eq!(
                LandmarkIndex::from_provider_index(lm.provider_index()),
                Some(lm)
            );
        }
    }

    #[test]
    fn test_provider_index_mapping() {
        assert_eq!(LandmarkIndex::Nose.provider_index(), 0);
        assert_eq!(LandmarkIndex::LeftShoulder.provider_index(), 11);
        assert_eq!(LandmarkIndex::LeftHip.provider_index(), 23);
        assert_eq!(LandmarkIndex::RightFootIndex.provider_index(), 32);
        // 顔周辺（1〜10）は追跡対象外
        assert_eq!(LandmarkIndex::from_provider_index(5), None);
        assert_eq!(LandmarkIndex::from_provider_index(33), None);
    }

    #[test]
    fn test_landmark_is_visible() {
        let lm = Landmark::new(0.5, 0.5, 0.5);
        // 閾値ちょうどは不可視
        assert!(!lm.is_visible(0.5));
        assert!(lm.is_visible(0.4));
    }

    #[test]
    fn test_landmark_to_pixel() {
        let lm = Landmark::new(0.5, 0.25, 1.0);
        let (px, py) = lm.to_pixel(640, 480);
        assert_eq!(px, 320.0);
        assert_eq!(py, 120.0);
    }

    #[test]
    fn test_landmark_default_is_missing() {
        let lm = Landmark::default();
        assert_eq!(lm.visibility, 0.0);
        assert!(!lm.is_visible(0.0));
    }

    fn make_frame() -> Frame {
        Frame {
            timestamp_ms: 1000,
            frame_number: 0,
            frame_time: 0.0,
            landmarks_2d: [Landmark::new(0.5, 0.5, 0.9); LandmarkIndex::COUNT],
            landmarks_3d: [Landmark::new_3d(0.1, 0.2, 1.5, 0.9); LandmarkIndex::COUNT],
            confidence: [0.9; LandmarkIndex::COUNT],
        }
    }

    #[test]
    fn test_frame_summary() {
        let summary = make_frame().summary();
        assert_eq!(summary.total_points, 17);
        assert!((summary.avg_depth_mm - 1500.0).abs() < 0.1);
        assert!((summary.avg_confidence - 0.9).abs() < 0.001);
        assert_eq!(summary.valid_points, 17);
    }

    #[test]
    fn test_frame_summary_low_confidence() {
        let mut frame = make_frame();
        frame.confidence = [0.5; LandmarkIndex::COUNT];
        frame.confidence[0] = 0.8;
        let summary = frame.summary();
        assert_eq!(summary.valid_points, 1);
    }

    #[test]
    fn test_frame_serde_roundtrip() {
        let frame = make_frame();
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
