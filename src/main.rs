use roomsync::routes;
use roomsync::state::AppState;
use roomsync::store::RoomStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    // The store is constructed here and injected — nothing else in the
    // process holds room state.
    let state = AppState::new(RoomStore::new());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "roomsync listening");
    axum::serve(listener, app).await.expect("server failed");
}
