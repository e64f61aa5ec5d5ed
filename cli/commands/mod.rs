mod configure;
mod download;
mod publish;
mod update;

pub use configure::*;
pub use download::*;
pub use publish::*;
pub use update::*;
