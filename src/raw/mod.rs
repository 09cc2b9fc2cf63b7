mod arena;
mod bulk;
mod handle;
mod node;
mod raw_btree;

pub(crate) use handle::Handle;
pub(crate) use node::Bias;
pub(crate) use raw_btree::RawBTree;
