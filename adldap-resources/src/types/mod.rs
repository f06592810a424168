//! 资源声明与状态类型

mod computer;
mod organizational_unit;
mod service_principal;
mod user;

pub use computer::{ComputerConfig, ComputerState};
pub use organizational_unit::{OrganizationalUnitConfig, OrganizationalUnitState};
pub use service_principal::{ServicePrincipalConfig, ServicePrincipalId, ServicePrincipalState};
pub use user::{UserConfig, UserState};
