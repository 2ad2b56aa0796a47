/// Height of a block in the platform chain.
pub type BlockHeight = u64;

pub mod link;
