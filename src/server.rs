use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Res, api, types::PkceState};

/// Binds the loopback callback listener on an ephemeral port.
pub async fn bind_loopback() -> Res<(TcpListener, u16)> {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

/// Serves `/callback` until the task is aborted.
pub async fn start_callback_server(listener: TcpListener, state: Arc<Mutex<PkceState>>) -> Res<()> {
    let app = Router::new().route("/callback", get(api::callback).layer(Extension(state)));

    axum::serve(listener, app).await?;
    Ok(())
}
