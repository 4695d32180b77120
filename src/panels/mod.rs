mod central_panel;
mod error_banner;
mod layers_panel;
mod properties_panel;
mod toolbar;
mod tools_panel;

pub use central_panel::central_panel;
pub use error_banner::ErrorBanner;
pub use layers_panel::layers_panel;
pub use properties_panel::properties_panel;
pub use toolbar::toolbar;
pub use tools_panel::tools_panel;
