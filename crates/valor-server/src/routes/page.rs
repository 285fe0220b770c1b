use axum::extract::State;
use axum::response::Html;

use crate::state::AppState;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}
