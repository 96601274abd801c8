pub mod init;
pub mod ls;
pub mod rm;
pub mod revoke;
pub mod serve;
pub mod share;
pub mod upload;
pub mod version;
pub mod whoami;

pub use init::Init;
pub use serve::Serve;
pub use upload::Upload;
pub use version::Version;

// Request structs double as subcommand args; the Op impls live alongside
pub use docshelf_app::http_server::api::v0::docs::delete::DeleteRequest;
pub use docshelf_app::http_server::api::v0::docs::list::ListRequest;
pub use docshelf_app::http_server::api::v0::docs::revoke::RevokeRequest;
pub use docshelf_app::http_server::api::v0::docs::share::ShareRequest;
pub use docshelf_app::http_server::api::v0::session::whoami::WhoamiRequest;
