// Route path constants - single source of truth for the gateway's own paths

use common::utils::path_has_prefix;

pub const ROOT: &str = "/";
pub const HEALTH: &str = "/health";
pub const OPENAPI: &str = "/api/openapi.json";
pub const UPLOADS: &str = "/uploads";

/// The route modules the gateway fronts. Each one is owned by an upstream
/// collaborator and reached through its path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteModule {
    Auth,
    Products,
    Orders,
    Cart,
    User,
    Payments,
    Contact,
    Admin,
    Reviews,
}

impl RouteModule {
    pub const ALL: [RouteModule; 9] = [
        RouteModule::Auth,
        RouteModule::Products,
        RouteModule::Orders,
        RouteModule::Cart,
        RouteModule::User,
        RouteModule::Payments,
        RouteModule::Contact,
        RouteModule::Admin,
        RouteModule::Reviews,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            RouteModule::Auth => "/api/auth",
            RouteModule::Products => "/api/products",
            RouteModule::Orders => "/api/orders",
            RouteModule::Cart => "/api/cart",
            RouteModule::User => "/api/user",
            RouteModule::Payments => "/api/paypal",
            RouteModule::Contact => "/api/contact",
            RouteModule::Admin => "/api/admin",
            RouteModule::Reviews => "/api/reviews",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RouteModule::Auth => "auth",
            RouteModule::Products => "products",
            RouteModule::Orders => "orders",
            RouteModule::Cart => "cart",
            RouteModule::User => "user",
            RouteModule::Payments => "payments",
            RouteModule::Contact => "contact",
            RouteModule::Admin => "admin",
            RouteModule::Reviews => "reviews",
        }
    }
}

/// Prefix table, ordered longest prefix first. Built once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    mounts: Vec<RouteModule>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RouteModule::ALL)
    }
}

impl RouteTable {
    pub fn new(modules: impl IntoIterator<Item = RouteModule>) -> Self {
        let mut mounts: Vec<RouteModule> = Vec::new();
        for module in modules {
            if !mounts.contains(&module) {
                mounts.push(module);
            }
        }
        mounts.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Self { mounts }
    }

    pub fn modules(&self) -> impl Iterator<Item = RouteModule> + '_ {
        self.mounts.iter().copied()
    }

    /// Finds the module owning `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<RouteModule> {
        self.mounts
            .iter()
            .copied()
            .find(|module| path_has_prefix(path, module.prefix()))
    }
}
