use nalgebra::Vector3;

use crate::landmark::LandmarkIndex;
use crate::stereo::Point3D;

use super::joints::{Joint, JointId};

/// 点列からランドマークを検索してベクトルに変換
fn find_point(points: &[Point3D], keypoint: LandmarkIndex) -> Option<Vector3<f32>> {
    points
        .iter()
        .find(|p| p.keypoint == keypoint)
        .map(|p| Vector3::new(p.x, p.y, p.z))
}

/// ルート（腰）位置: 左右股関節の中点をscaleで割った値
///
/// どちらかの股関節が欠損している場合は原点。
/// scale=100で入力ミリメートル→出力センチメートル。
pub fn root_position(points: &[Point3D], scale: f32) -> [f32; 3] {
    let left = find_point(points, LandmarkIndex::LeftHip);
    let right = find_point(points, LandmarkIndex::RightHip);

    match (left, right) {
        (Some(left), Some(right)) => {
            let mid = (left + right) * 0.5;
            [mid.x / scale, mid.y / scale, mid.z / scale]
        }
        _ => [0.0, 0.0, 0.0],
    }
}

/// 関節回転を度で計算。戻り値は [x, y, z]
///
/// 回転を持つのは四肢セグメント8関節のみ（上腕・前腕・大腿・下腿の
/// 左右）。それ以外の関節は常にゼロ回転。ソースランドマークが
/// 欠損した関節もゼロ回転になり、フレーム処理は継続する。
pub fn joint_rotation(joint: &Joint, points: &[Point3D]) -> [f32; 3] {
    match joint.id {
        JointId::LeftArm
        | JointId::RightArm
        | JointId::LeftForeArm
        | JointId::RightForeArm
        | JointId::LeftUpLeg
        | JointId::RightUpLeg
        | JointId::LeftLeg
        | JointId::RightLeg => segment_rotation(joint, points),
        _ => [0.0, 0.0, 0.0],
    }
}

/// セグメント方向ベクトル v = 子 - 親 から2角度を抽出
///
/// angle_y: XZ平面での向き、angle_x: 水平からの仰俯角。
/// ロール（angle_z）は2点からは求まらないため常に0。
fn segment_rotation(joint: &Joint, points: &[Point3D]) -> [f32; 3] {
    let (parent_lm, child_lm) = match joint.source {
        [parent_lm, child_lm] => (*parent_lm, *child_lm),
        _ => return [0.0, 0.0, 0.0],
    };

    let (parent, child) = match (find_point(points, parent_lm), find_point(points, child_lm)) {
        (Some(parent), Some(child)) => (parent, child),
        _ => return [0.0, 0.0, 0.0],
    };

    let v = child - parent;
    let angle_y = v.x.atan2(v.z).to_degrees();
    let angle_x = v.y.atan2((v.x * v.x + v.z * v.z).sqrt()).to_degrees();

    [angle_x, angle_y, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Skeleton;

    fn point(keypoint: LandmarkIndex, x: f32, y: f32, z: f32) -> Point3D {
        Point3D {
            keypoint,
            x,
            y,
            z,
            confidence: 0.9,
            disparity: 10.0,
        }
    }

    fn assert_angles(actual: [f32; 3], expected: [f32; 3]) {
        for axis in 0..3 {
            assert!(
                (actual[axis] - expected[axis]).abs() < 0.01,
                "axis {}: expected {}, got {}",
                axis,
                expected[axis],
                actual[axis]
            );
        }
    }

    #[test]
    fn test_root_position_midpoint() {
        let points = [
            point(LandmarkIndex::LeftHip, 100.0, 50.0, 1000.0),
            point(LandmarkIndex::RightHip, -100.0, 70.0, 1200.0),
        ];
        let pos = root_position(&points, 100.0);
        assert_angles(pos, [0.0, 0.6, 11.0]);
    }

    #[test]
    fn test_root_position_missing_hip() {
        let points = [point(LandmarkIndex::LeftHip, 100.0, 50.0, 1000.0)];
        assert_eq!(root_position(&points, 100.0), [0.0, 0.0, 0.0]);
        assert_eq!(root_position(&[], 100.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_limb_pointing_down() {
        // 肩の真下に肘: v = (0, 300, 0) → x=90度, y=0度
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::LeftShoulder, 100.0, 0.0, 1000.0),
            point(LandmarkIndex::LeftElbow, 100.0, 300.0, 1000.0),
        ];
        let rot = joint_rotation(skeleton.joint(JointId::LeftArm), &points);
        assert_angles(rot, [90.0, 0.0, 0.0]);
    }

    #[test]
    fn test_limb_pointing_sideways() {
        // v = (300, 0, 0) → y=90度, x=0度
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::RightHip, 0.0, 0.0, 1000.0),
            point(LandmarkIndex::RightKnee, 300.0, 0.0, 1000.0),
        ];
        let rot = joint_rotation(skeleton.joint(JointId::RightUpLeg), &points);
        assert_angles(rot, [0.0, 90.0, 0.0]);
    }

    #[test]
    fn test_limb_diagonal() {
        // v = (0, 100, 100) → x=45度, y=0度
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::LeftElbow, 0.0, 0.0, 1000.0),
            point(LandmarkIndex::LeftWrist, 0.0, 100.0, 1100.0),
        ];
        let rot = joint_rotation(skeleton.joint(JointId::LeftForeArm), &points);
        assert_angles(rot, [45.0, 0.0, 0.0]);
    }

    #[test]
    fn test_roll_is_never_estimated() {
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::LeftKnee, 50.0, 100.0, 900.0),
            point(LandmarkIndex::LeftAnkle, -30.0, 400.0, 1100.0),
        ];
        let rot = joint_rotation(skeleton.joint(JointId::LeftLeg), &points);
        assert_eq!(rot[2], 0.0);
    }

    #[test]
    fn test_non_limb_joints_zero_rotation() {
        // 脊椎はソースランドマークがあってもゼロ回転
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::LeftShoulder, 150.0, 0.0, 1000.0),
            point(LandmarkIndex::RightShoulder, -150.0, 0.0, 1000.0),
            point(LandmarkIndex::Nose, 0.0, -200.0, 1000.0),
        ];
        for id in [
            JointId::Hips,
            JointId::Spine,
            JointId::Spine1,
            JointId::Neck,
            JointId::Head,
            JointId::LeftShoulder,
            JointId::LeftHand,
            JointId::RightFoot,
        ] {
            let rot = joint_rotation(skeleton.joint(id), &points);
            assert_eq!(rot, [0.0, 0.0, 0.0], "{:?}", id);
        }
    }

    #[test]
    fn test_missing_landmark_zero_rotation() {
        // 肘が欠損 → LeftArmはゼロ回転（エラーにはしない）
        let skeleton = Skeleton::mediapipe();
        let points = [point(LandmarkIndex::LeftShoulder, 100.0, 0.0, 1000.0)];
        let rot = joint_rotation(skeleton.joint(JointId::LeftArm), &points);
        assert_eq!(rot, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_length_segment() {
        // 親子が同一座標 → ゼロベクトル → ゼロ回転
        let skeleton = Skeleton::mediapipe();
        let points = [
            point(LandmarkIndex::LeftShoulder, 100.0, 100.0, 1000.0),
            point(LandmarkIndex::LeftElbow, 100.0, 100.0, 1000.0),
        ];
        let rot = joint_rotation(skeleton.joint(JointId::LeftArm), &points);
        assert_eq!(rot, [0.0, 0.0, 0.0]);
    }
}
