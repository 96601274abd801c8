pub mod args;
pub mod op;
pub mod ops;

pub use ops::{
    DeleteRequest, Init, ListRequest, RevokeRequest, Serve, ShareRequest, Upload, Version,
    WhoamiRequest,
};
