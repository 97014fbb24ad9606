pub mod joints;
pub mod rotation;

pub use joints::{ChannelSet, Joint, JointId, Skeleton};
pub use rotation::{joint_rotation, root_position};
