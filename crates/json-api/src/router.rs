//! App Router

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};

use crate::{
    auth, carts, checkout, healthcheck, ledger,
    observability::{metrics_handler, request_logging},
    orders, payments, products, returns, shipments,
    state::State,
    withdrawals,
};

/// Every route the server exposes except the API docs.
pub(crate) fn app_router(state: Arc<State>) -> Router {
    Router::new()
        .hoop(CatchPanic::new())
        .hoop(request_logging)
        .hoop(remove_slash())
        .hoop(inject(state))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(Router::with_path("payments/webhook").post(payments::webhook::handler))
        .push(api_router())
}

/// Routes that require a bearer token.
fn api_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("cart")
                .get(carts::get::handler)
                .push(
                    Router::with_path("items")
                        .post(carts::add_item::handler)
                        .push(Router::with_path("{item}").delete(carts::remove_item::handler)),
                ),
        )
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .post(products::create::handler)
                .push(
                    Router::with_path("{product}")
                        .get(products::get::handler)
                        .put(products::update::handler),
                ),
        )
        .push(
            Router::with_path("checkout")
                .post(checkout::place::handler)
                .push(Router::with_path("quote").post(checkout::quote::handler)),
        )
        .push(Router::with_path("payments/{payment}").get(payments::get::handler))
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .push(Router::with_path("cancel").post(orders::cancel::handler)),
                ),
        )
        .push(
            Router::with_path("shipments")
                .push(Router::with_path("available").get(shipments::available::handler))
                .push(
                    Router::with_path("{shipment}")
                        .get(shipments::get::handler)
                        .push(Router::with_path("ready").post(shipments::transitions::ready))
                        .push(Router::with_path("accept").post(shipments::transitions::accept))
                        .push(Router::with_path("arrive").post(shipments::transitions::arrive))
                        .push(Router::with_path("deliver").post(shipments::transitions::deliver))
                        .push(Router::with_path("fail").post(shipments::transitions::fail)),
                ),
        )
        .push(
            Router::with_path("returns")
                .get(returns::index::handler)
                .post(returns::create::handler)
                .push(
                    Router::with_path("{request}")
                        .get(returns::get::handler)
                        .push(Router::with_path("approve").post(returns::review::approve))
                        .push(Router::with_path("reject").post(returns::review::reject)),
                ),
        )
        .push(
            Router::with_path("withdrawals")
                .get(withdrawals::index::handler)
                .post(withdrawals::create::handler)
                .push(
                    Router::with_path("{withdrawal}")
                        .get(withdrawals::get::handler)
                        .push(Router::with_path("approve").post(withdrawals::workflow::approve))
                        .push(Router::with_path("reject").post(withdrawals::workflow::reject))
                        .push(Router::with_path("process").post(withdrawals::workflow::process))
                        .push(Router::with_path("complete").post(withdrawals::workflow::complete)),
                ),
        )
        .push(
            Router::with_path("ledger")
                .push(Router::with_path("balance").get(ledger::balance::handler))
                .push(Router::with_path("history").get(ledger::history::handler)),
        )
}
