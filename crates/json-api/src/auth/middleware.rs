//! Auth middleware.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use souq_app::auth::AuthServiceError;

use crate::{extensions::*, state::State};

/// Resolve the bearer token to an actor and make it available to handlers.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(token) = extract_bearer_token(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid Authorization header"));
        ctrl.skip_rest();

        return;
    };

    let Ok(state) = depot.obtain_or_500::<Arc<State>>() else {
        res.render(StatusError::internal_server_error());
        ctrl.skip_rest();

        return;
    };

    let actor = match state.app.auth.authenticate_bearer(token).await {
        Ok(actor) => actor,
        Err(AuthServiceError::NotFound | AuthServiceError::Token(_)) => {
            res.render(StatusError::unauthorized().brief("Invalid API token"));
            ctrl.skip_rest();

            return;
        }
        Err(AuthServiceError::UnknownUser) => {
            res.render(StatusError::unauthorized().brief("Token owner no longer exists"));
            ctrl.skip_rest();

            return;
        }
        Err(AuthServiceError::Sql(source)) => {
            error!("failed to validate api token: {source}");

            res.render(StatusError::internal_server_error());
            ctrl.skip_rest();

            return;
        }
    };

    depot.insert_actor(actor);

    ctrl.call_next(req, depot, res).await;
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;
    use uuid::Uuid;

    use souq::{
        actors::{Actor, Role},
        regions::Region,
    };

    use crate::test_helpers::Mocks;

    use super::*;

    #[salvo::handler]
    async fn echo_actor(depot: &mut Depot, res: &mut Response) {
        let actor = depot.actor_or_401().ok().map_or_else(
            || "missing".to_string(),
            |actor| format!("{}:{}", actor.user, actor.role),
        );

        res.render(actor);
    }

    fn make_service(mocks: Mocks) -> Service {
        Service::new(
            Router::new()
                .hoop(salvo::affix_state::inject(mocks.into_state()))
                .hoop(handler)
                .push(Router::new().get(echo_actor)),
        )
    }

    #[tokio::test]
    async fn missing_authorization_header_returns_401() {
        let mut mocks = Mocks::default();

        mocks.auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com")
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn non_bearer_scheme_returns_401() {
        let mut mocks = Mocks::default();

        mocks.auth.expect_authenticate_bearer().never();

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Basic abc123", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn unknown_token_returns_401() {
        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .withf(|token| token == "sq_abc")
            .return_once(|_| Err(AuthServiceError::NotFound));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer sq_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn valid_token_injects_actor() -> TestResult {
        let user = Uuid::now_v7();
        let actor = Actor::new(user, Role::DeliveryPerson, Some(Region::new("giza")));

        let mut mocks = Mocks::default();

        mocks
            .auth
            .expect_authenticate_bearer()
            .once()
            .withf(|token| token == "sq_abc")
            .return_once(move |_| Ok(actor));

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "bearer sq_abc", true)
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, format!("{user}:delivery_person"));

        Ok(())
    }
}
