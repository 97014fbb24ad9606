use thiserror::Error;

use crate::config::ExportConfig;
use crate::landmark::{Frame, LandmarkIndex};
use crate::skeleton::{joint_rotation, root_position, JointId, Skeleton};
use crate::stereo::Point3D;

/// BVHエクスポートの失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    /// 記録フレームが1つもない
    #[error("no recorded frames to export")]
    NoData,
}

/// エクスポート設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// モーションのフレームレート
    pub fps: u32,
    /// 3D座標の除数（100でミリメートル→センチメートル）
    pub scale: f32,
}

impl ExportOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            fps: config.fps,
            scale: config.scale,
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            scale: 100.0,
        }
    }
}

/// フレームのワールドランドマーク（メートル）をエクスポート用の
/// 3D点列（ミリメートル）に変換
///
/// 可視性0のランドマークは欠損として除外する。ステレオ記録では
/// 復元できなかったスロットがここで落ち、該当関節はゼロ回転になる。
pub fn frame_points(frame: &Frame) -> Vec<Point3D> {
    let mut points = Vec::with_capacity(LandmarkIndex::COUNT);
    for (i, lm) in frame.landmarks_3d.iter().enumerate() {
        if lm.visibility <= 0.0 {
            continue;
        }
        if let Some(keypoint) = LandmarkIndex::from_index(i) {
            points.push(Point3D {
                keypoint,
                x: lm.x * 1000.0,
                y: lm.y * 1000.0,
                z: lm.z * 1000.0,
                confidence: frame.confidence[i],
                disparity: 0.0,
            });
        }
    }
    points
}

/// HIERARCHYブロックを出力（末尾にMOTION行を含む）
///
/// ルートから深さ優先で再帰し、子はテーブルの定義順。
pub fn write_hierarchy(skeleton: &Skeleton) -> String {
    let mut out = String::from("HIERARCHY\n");
    write_joint(&mut out, skeleton, skeleton.root(), 0);
    out.push_str("MOTION\n");
    out
}

fn write_joint(out: &mut String, skeleton: &Skeleton, id: JointId, depth: usize) {
    let joint = skeleton.joint(id);
    let indent = "  ".repeat(depth);
    let keyword = if joint.parent.is_none() { "ROOT" } else { "JOINT" };

    out.push_str(&format!("{}{} {}\n", indent, keyword, id.name()));
    out.push_str(&format!("{}{{\n", indent));
    out.push_str(&format!(
        "{}  OFFSET {:.6} {:.6} {:.6}\n",
        indent, joint.offset[0], joint.offset[1], joint.offset[2]
    ));
    out.push_str(&format!(
        "{}  CHANNELS {} {}\n",
        indent,
        joint.channels.count(),
        joint.channels.labels()
    ));
    for &child in joint.children {
        write_joint(out, skeleton, child, depth + 1);
    }
    out.push_str(&format!("{}}}\n", indent));
}

/// MOTIONブロックのデータ部を出力
///
/// 各行はルート位置 (x y z) に続き、階層出力と同じ深さ優先順で
/// 各関節の回転 (z x y)。使える3D点がないフレームは全チャンネル
/// 0の行になる。
pub fn write_motion(skeleton: &Skeleton, frames: &[Frame], options: &ExportOptions) -> String {
    let fps = options.fps.max(1);
    let order = skeleton.traversal();

    let mut out = String::new();
    out.push_str(&format!("Frames: {}\n", frames.len()));
    out.push_str(&format!("Frame Time: {:.6}\n", 1.0 / fps as f32));

    for frame in frames {
        let points = frame_points(frame);
        motion_row(&mut out, skeleton, &order, &points, options.scale);
    }
    out
}

fn motion_row(
    out: &mut String,
    skeleton: &Skeleton,
    order: &[JointId],
    points: &[Point3D],
    scale: f32,
) {
    let mut values: Vec<f32> = Vec::with_capacity(skeleton.total_channels());

    if points.is_empty() {
        values.resize(skeleton.total_channels(), 0.0);
    } else {
        values.extend_from_slice(&root_position(points, scale));
        for &id in order {
            let rot = joint_rotation(skeleton.joint(id), points);
            // チャンネル順は Z X Y
            values.push(rot[2]);
            values.push(rot[0]);
            values.push(rot[1]);
        }
    }

    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:.6}", value));
    }
    out.push('\n');
}

/// フレーム列をBVHテキストに変換
///
/// フレームが空なら NoData。それ以外では失敗しない。
pub fn export_motion_data(
    skeleton: &Skeleton,
    frames: &[Frame],
    options: &ExportOptions,
) -> Result<String, ExportError> {
    if frames.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut bvh = write_hierarchy(skeleton);
    bvh.push_str(&write_motion(skeleton, frames, options));
    Ok(bvh)
}

/// BVHテキストの簡易構造チェック
///
/// HIERARCHY行・MOTION行・ROOTで始まる行があるかのみ確認する。
pub fn validate(text: &str) -> bool {
    let mut has_hierarchy = false;
    let mut has_motion = false;
    let mut has_root = false;

    for line in text.lines() {
        let line = line.trim();
        if line == "HIERARCHY" {
            has_hierarchy = true;
        } else if line == "MOTION" {
            has_motion = true;
        } else if line.starts_with("ROOT") {
            has_root = true;
        }
    }

    has_hierarchy && has_motion && has_root
}
