use utoipa::OpenApi;

use common::{DatabaseStatus, HealthResponse, MessageResponse, ServiceStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pet Accessories Backend",
        description = "Edge gateway in front of the shop's route modules"
    ),
    paths(
        crate::web_server::root,
        crate::web_server::health,
    ),
    components(schemas(HealthResponse, DatabaseStatus, ServiceStatus, MessageResponse)),
    tags(
        (name = "gateway", description = "Liveness and health of the gateway itself")
    )
)]
pub struct ApiDoc;
