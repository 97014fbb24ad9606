use crate::landmark::LandmarkIndex;

/// BVH骨格の19関節
///
/// 列挙子の値はテーブル内位置。定義順はHipsからの深さ優先順に
/// 一致させてあり、traversal() のテストで検証される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointId {
    Hips = 0,
    Spine = 1,
    Spine1 = 2,
    Neck = 3,
    Head = 4,
    LeftShoulder = 5,
    LeftArm = 6,
    LeftForeArm = 7,
    LeftHand = 8,
    RightShoulder = 9,
    RightArm = 10,
    RightForeArm = 11,
    RightHand = 12,
    LeftUpLeg = 13,
    LeftLeg = 14,
    LeftFoot = 15,
    RightUpLeg = 16,
    RightLeg = 17,
    RightFoot = 18,
}

impl JointId {
    pub const COUNT: usize = 19;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Hips),
            1 => Some(Self::Spine),
            2 => Some(Self::Spine1),
            3 => Some(Self::Neck),
            4 => Some(Self::Head),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::LeftArm),
            7 => Some(Self::LeftForeArm),
            8 => Some(Self::LeftHand),
            9 => Some(Self::RightShoulder),
            10 => Some(Self::RightArm),
            11 => Some(Self::RightForeArm),
            12 => Some(Self::RightHand),
            13 => Some(Self::LeftUpLeg),
            14 => Some(Self::LeftLeg),
            15 => Some(Self::LeftFoot),
            16 => Some(Self::RightUpLeg),
            17 => Some(Self::RightLeg),
            18 => Some(Self::RightFoot),
            _ => None,
        }
    }

    /// BVHファイルに書き出す関節名
    pub fn name(self) -> &'static str {
        match self {
            Self::Hips => "Hips",
            Self::Spine => "Spine",
            Self::Spine1 => "Spine1",
            Self::Neck => "Neck",
            Self::Head => "Head",
            Self::LeftShoulder => "LeftShoulder",
            Self::LeftArm => "LeftArm",
            Self::LeftForeArm => "LeftForeArm",
            Self::LeftHand => "LeftHand",
            Self::RightShoulder => "RightShoulder",
            Self::RightArm => "RightArm",
            Self::RightForeArm => "RightForeArm",
            Self::RightHand => "RightHand",
            Self::LeftUpLeg => "LeftUpLeg",
            Self::LeftLeg => "LeftLeg",
            Self::LeftFoot => "LeftFoot",
            Self::RightUpLeg => "RightUpLeg",
            Self::RightLeg => "RightLeg",
            Self::RightFoot => "RightFoot",
        }
    }
}

/// 関節のチャンネル構成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSet {
    /// ルートのみ: 位置3 + 回転3
    Root,
    /// 回転のみ
    Rotation,
}

impl ChannelSet {
    pub fn count(self) -> usize {
        match self {
            Self::Root => 6,
            Self::Rotation => 3,
        }
    }

    /// CHANNELS行のラベル列
    pub fn labels(self) -> &'static str {
        match self {
            Self::Root => "Xposition Yposition Zposition Zrotation Xrotation Yrotation",
            Self::Rotation => "Zrotation Xrotation Yrotation",
        }
    }
}

/// 骨格テーブルの1関節分
#[derive(Debug, Clone, Copy)]
pub struct Joint {
    pub id: JointId,
    pub parent: Option<JointId>,
    /// 子関節（階層出力順）
    pub children: &'static [JointId],
    pub channels: ChannelSet,
    /// 回転計算に使うランドマーク。2要素なら [親側, 子側]
    pub source: &'static [LandmarkIndex],
    /// 基準オフセット（センチメートル、理想化された人体比率）
    pub offset: [f32; 3],
}

/// MediaPipeランドマーク向け骨格テーブル
///
/// 定義順 = Hipsからの深さ優先順 = モーション行の関節順。
/// オフセットは被写体から測定したものではなく固定値。
static MEDIAPIPE_JOINTS: [Joint; JointId::COUNT] = [
    Joint {
        id: JointId::Hips,
        parent: None,
        children: &[JointId::Spine, JointId::LeftUpLeg, JointId::RightUpLeg],
        channels: ChannelSet::Root,
        source: &[LandmarkIndex::LeftHip, LandmarkIndex::RightHip],
        offset: [0.0, 0.0, 0.0],
    },
    Joint {
        id: JointId::Spine,
        parent: Some(JointId::Hips),
        children: &[JointId::Spine1],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder],
        offset: [0.0, 10.0, 0.0],
    },
    Joint {
        id: JointId::Spine1,
        parent: Some(JointId::Spine),
        children: &[JointId::Neck],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder],
        offset: [0.0, 15.0, 0.0],
    },
    Joint {
        id: JointId::Neck,
        parent: Some(JointId::Spine1),
        children: &[JointId::Head, JointId::LeftShoulder, JointId::RightShoulder],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::Nose],
        offset: [0.0, 20.0, 0.0],
    },
    Joint {
        id: JointId::Head,
        parent: Some(JointId::Neck),
        children: &[],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::Nose],
        offset: [0.0, 15.0, 0.0],
    },
    Joint {
        id: JointId::LeftShoulder,
        parent: Some(JointId::Neck),
        children: &[JointId::LeftArm],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftShoulder],
        offset: [15.0, 0.0, 0.0],
    },
    Joint {
        id: JointId::LeftArm,
        parent: Some(JointId::LeftShoulder),
        children: &[JointId::LeftForeArm],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow],
        offset: [0.0, -25.0, 0.0],
    },
    Joint {
        id: JointId::LeftForeArm,
        parent: Some(JointId::LeftArm),
        children: &[JointId::LeftHand],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist],
        offset: [0.0, -25.0, 0.0],
    },
    Joint {
        id: JointId::LeftHand,
        parent: Some(JointId::LeftForeArm),
        children: &[],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftWrist],
        offset: [0.0, -15.0, 0.0],
    },
    Joint {
        id: JointId::RightShoulder,
        parent: Some(JointId::Neck),
        children: &[JointId::RightArm],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightShoulder],
        offset: [-15.0, 0.0, 0.0],
    },
    Joint {
        id: JointId::RightArm,
        parent: Some(JointId::RightShoulder),
        children: &[JointId::RightForeArm],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow],
        offset: [0.0, -25.0, 0.0],
    },
    Joint {
        id: JointId::RightForeArm,
        parent: Some(JointId::RightArm),
        children: &[JointId::RightHand],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightElbow, LandmarkIndex::RightWrist],
        offset: [0.0, -25.0, 0.0],
    },
    Joint {
        id: JointId::RightHand,
        parent: Some(JointId::RightForeArm),
        children: &[],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightWrist],
        offset: [0.0, -15.0, 0.0],
    },
    Joint {
        id: JointId::LeftUpLeg,
        parent: Some(JointId::Hips),
        children: &[JointId::LeftLeg],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee],
        offset: [10.0, 0.0, 0.0],
    },
    Joint {
        id: JointId::LeftLeg,
        parent: Some(JointId::LeftUpLeg),
        children: &[JointId::LeftFoot],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle],
        offset: [0.0, -40.0, 0.0],
    },
    Joint {
        id: JointId::LeftFoot,
        parent: Some(JointId::LeftLeg),
        children: &[],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::LeftAnkle],
        offset: [0.0, -40.0, 0.0],
    },
    Joint {
        id: JointId::RightUpLeg,
        parent: Some(JointId::Hips),
        children: &[JointId::RightLeg],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightHip, LandmarkIndex::RightKnee],
        offset: [-10.0, 0.0, 0.0],
    },
    Joint {
        id: JointId::RightLeg,
        parent: Some(JointId::RightUpLeg),
        children: &[JointId::RightFoot],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle],
        offset: [0.0, -40.0, 0.0],
    },
    Joint {
        id: JointId::RightFoot,
        parent: Some(JointId::RightLeg),
        children: &[],
        channels: ChannelSet::Rotation,
        source: &[LandmarkIndex::RightAnkle],
        offset: [0.0, -40.0, 0.0],
    },
];

/// 読み取り専用の骨格定義
///
/// プロセス起動時に一度構築し、参照で引き回す。
#[derive(Debug, Clone, Copy)]
pub struct Skeleton {
    root: JointId,
    joints: &'static [Joint; JointId::COUNT],
}

impl Skeleton {
    /// MediaPipeランドマーク向けの標準骨格
    pub fn mediapipe() -> Self {
        Self {
            root: JointId::Hips,
            joints: &MEDIAPIPE_JOINTS,
        }
    }

    pub fn root(&self) -> JointId {
        self.root
    }

    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id as usize]
    }

    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter()
    }

    /// 全関節のチャンネル数合計（モーション行の値数）
    pub fn total_channels(&self) -> usize {
        self.joints.iter().map(|j| j.channels.count()).sum()
    }

    /// ルートからの深さ優先順
    ///
    /// 階層出力とモーション行出力の両方がこの順序を使う。
    pub fn traversal(&self) -> Vec<JointId> {
        let mut order = Vec::with_capacity(JointId::COUNT);
        self.walk(self.root, &mut order);
        order
    }

    fn walk(&self, id: JointId, out: &mut Vec<JointId>) {
        out.push(id);
        for &child in self.joint(id).children {
            self.walk(child, out);
        }
    }
}
