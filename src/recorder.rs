use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::landmark::{Frame, Landmark, LandmarkIndex};
use crate::stereo::Point3D;

struct RecorderState {
    recording: bool,
    started: Option<Instant>,
    frames: Vec<Frame>,
}

/// ランドマーク記録の状態機械（Idle / Recording）
///
/// 録画中フラグの判定とフレーム追記は同一ロック内で行うため、
/// 並行するstop()に対して1単位として観測される。stop()完了後の
/// tickが古いフラグで追記することはない。スレッド間では
/// Arc<FrameRecorder> で共有する。
pub struct FrameRecorder {
    state: Mutex<RecorderState>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecorderState {
                recording: false,
                started: None,
                frames: Vec::new(),
            }),
        }
    }

    /// 記録開始。バッファをクリアして開始時刻を取る。
    /// 記録中に呼ぶと新しいセッションとして取り直しになる。
    pub fn start(&self) {
        let mut state = self.state.lock().unwrap();
        state.frames.clear();
        state.recording = true;
        state.started = Some(Instant::now());
    }

    /// 記録停止。バッファは保持される。
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.recording = false;
        state.started = None;
    }

    /// バッファを空にする。Idle時のみ有効で、記録中はfalseを返し
    /// バッファに触れない。
    pub fn clear(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.recording {
            return false;
        }
        state.frames.clear();
        true
    }

    /// 1tick分のランドマークを追記
    ///
    /// 記録中でなければfalse。フレーム番号・経過秒・タイムスタンプは
    /// ロック内で確定する。信頼度は2Dランドマークの可視性から取る。
    pub fn record(
        &self,
        landmarks_2d: [Landmark; LandmarkIndex::COUNT],
        landmarks_3d: [Landmark; LandmarkIndex::COUNT],
    ) -> bool {
        let confidence = landmarks_2d.map(|lm| lm.visibility);
        let mut state = self.state.lock().unwrap();
        append_locked(&mut state, landmarks_2d, landmarks_3d, confidence)
    }

    /// ステレオ復元点を追記
    ///
    /// 疎な3D点列（ミリメートル）を17スロットのワールド配列
    /// （メートル）に展開する。欠損スロットは可視性0のまま。
    pub fn record_points(
        &self,
        landmarks_2d: [Landmark; LandmarkIndex::COUNT],
        points: &[Point3D],
    ) -> bool {
        let mut landmarks_3d = [Landmark::default(); LandmarkIndex::COUNT];
        let mut confidence = [0.0f32; LandmarkIndex::COUNT];
        for point in points {
            let slot = point.keypoint as usize;
            landmarks_3d[slot] = Landmark::new_3d(
                point.x / 1000.0,
                point.y / 1000.0,
                point.z / 1000.0,
                point.confidence,
            );
            confidence[slot] = point.confidence;
        }

        let mut state = self.state.lock().unwrap();
        append_locked(&mut state, landmarks_2d, landmarks_3d, confidence)
    }

    pub fn is_recording(&self) -> bool {
        self.state.lock().unwrap().recording
    }

    pub fn frame_count(&self) -> usize {
        self.state.lock().unwrap().frames.len()
    }

    /// 記録時間（秒）。最後に追記したフレームの経過秒で、
    /// 停止後も値を保つ。フレームがなければ0。
    pub fn duration(&self) -> f32 {
        let state = self.state.lock().unwrap();
        state.frames.last().map_or(0.0, |f| f.frame_time)
    }

    /// バッファのスナップショットを取得。何度でも取得可能。
    pub fn frames(&self) -> Vec<Frame> {
        self.state.lock().unwrap().frames.clone()
    }
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn append_locked(
    state: &mut RecorderState,
    landmarks_2d: [Landmark; LandmarkIndex::COUNT],
    landmarks_3d: [Landmark; LandmarkIndex::COUNT],
    confidence: [f32; LandmarkIndex::COUNT],
) -> bool {
    if !state.recording {
        return false;
    }

    let frame_time = state
        .started
        .map_or(0.0, |started| started.elapsed().as_secs_f32());
    let frame = Frame {
        timestamp_ms: now_ms(),
        frame_number: state.frames.len() as u32,
        frame_time,
        landmarks_2d,
        landmarks_3d,
        confidence,
    };
    state.frames.push(frame);
    true
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// 記録フレーム列をJSONで保存
pub fn save_frames<P: AsRef<Path>>(path: P, frames: &[Frame]) -> Result<()> {
    let json = serde_json::to_string_pretty(frames)?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
    Ok(())
}

/// JSONから記録フレーム列を読み込み
pub fn load_frames<P: AsRef<Path>>(path: P) -> Result<Vec<Frame>> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    let frames: Vec<Frame> = serde_json::from_str(&content)?;
    Ok(frames)
}
