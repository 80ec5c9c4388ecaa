use crate::error::ApiError;
use crate::pipelines::{mongo, postgres};
use crate::types::{
    Backend, IdForm, ProjectForm, SearchQuery, SprintForm, UpdateForm, UserForm,
};
use crate::views;
use crate::AppState;

use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, Redirect};
use log::info;

type PageResult = Result<Html<String>, ApiError>;
type RedirectResult = Result<Redirect, ApiError>;

/// Sends the browser back to the backend's index page with `303 See Other`.
fn back_to_index(backend: Backend) -> Redirect {
    Redirect::to(backend.index_path())
}

async fn render_index(state: &AppState, backend: Backend, query: &SearchQuery) -> PageResult {
    let search = query.term();
    let page = match backend {
        Backend::Postgres => {
            let client = state.postgres.as_ref();
            views::index_page(
                backend,
                &postgres::list_users(client).await?,
                &postgres::list_projects(client, search).await?,
                &postgres::list_sprints(client).await?,
                search,
            )
        }
        Backend::Mongo => {
            let db = &state.mongo;
            views::index_page(
                backend,
                &mongo::list_users(db).await?,
                &mongo::list_projects(db, search).await?,
                &mongo::list_sprints(db).await?,
                search,
            )
        }
    };
    Ok(Html(page))
}

/// Postgres index page: every user, project and sprint plus create forms.
/// `?search=` narrows projects to names containing the term.
pub(crate) async fn postgres_index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> PageResult {
    render_index(&state, Backend::Postgres, &query).await
}

/// Mongo index page, same layout as [`postgres_index`].
pub(crate) async fn mongo_index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> PageResult {
    render_index(&state, Backend::Mongo, &query).await
}

// Users

pub(crate) async fn create_user(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<UserForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::insert_user(&state.postgres, &form).await?,
        Backend::Mongo => mongo::insert_user(&state.mongo, &form).await?,
    }
    info!("User {} created in {}", form.username, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<UpdateForm<UserForm>>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::update_user(&state.postgres, &form.id, &form.fields).await?,
        Backend::Mongo => mongo::update_user(&state.mongo, &form.id, &form.fields).await?,
    }
    info!("User {} updated in {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn delete_user(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<IdForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::delete_user(&state.postgres, &form.id).await?,
        Backend::Mongo => mongo::delete_user(&state.mongo, &form.id).await?,
    }
    info!("User {} deleted from {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn show_user(
    State(state): State<AppState>,
    Path((backend, id)): Path<(Backend, String)>,
) -> PageResult {
    let user = match backend {
        Backend::Postgres => postgres::get_user(&state.postgres, &id).await?,
        Backend::Mongo => mongo::get_user(&state.mongo, &id).await?,
    };
    Ok(Html(views::user_page(backend, &user)))
}

// Projects

pub(crate) async fn create_project(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<ProjectForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::insert_project(&state.postgres, &form).await?,
        Backend::Mongo => mongo::insert_project(&state.mongo, &form).await?,
    }
    info!("Project {} created in {}", form.name, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn update_project(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<UpdateForm<ProjectForm>>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => {
            postgres::update_project(&state.postgres, &form.id, &form.fields).await?
        }
        Backend::Mongo => mongo::update_project(&state.mongo, &form.id, &form.fields).await?,
    }
    info!("Project {} updated in {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn delete_project(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<IdForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::delete_project(&state.postgres, &form.id).await?,
        Backend::Mongo => mongo::delete_project(&state.mongo, &form.id).await?,
    }
    info!("Project {} deleted from {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn show_project(
    State(state): State<AppState>,
    Path((backend, id)): Path<(Backend, String)>,
) -> PageResult {
    let project = match backend {
        Backend::Postgres => postgres::get_project(&state.postgres, &id).await?,
        Backend::Mongo => mongo::get_project(&state.mongo, &id).await?,
    };
    Ok(Html(views::project_page(backend, &project)))
}

// Sprints

pub(crate) async fn create_sprint(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<SprintForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::insert_sprint(&state.postgres, &form).await?,
        Backend::Mongo => mongo::insert_sprint(&state.mongo, &form).await?,
    }
    info!("Sprint {} created in {}", form.name, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn update_sprint(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<UpdateForm<SprintForm>>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::update_sprint(&state.postgres, &form.id, &form.fields).await?,
        Backend::Mongo => mongo::update_sprint(&state.mongo, &form.id, &form.fields).await?,
    }
    info!("Sprint {} updated in {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn delete_sprint(
    State(state): State<AppState>,
    Path(backend): Path<Backend>,
    Form(form): Form<IdForm>,
) -> RedirectResult {
    match backend {
        Backend::Postgres => postgres::delete_sprint(&state.postgres, &form.id).await?,
        Backend::Mongo => mongo::delete_sprint(&state.mongo, &form.id).await?,
    }
    info!("Sprint {} deleted from {}", form.id, backend);
    Ok(back_to_index(backend))
}

pub(crate) async fn show_sprint(
    State(state): State<AppState>,
    Path((backend, id)): Path<(Backend, String)>,
) -> PageResult {
    let sprint = match backend {
        Backend::Postgres => postgres::get_sprint(&state.postgres, &id).await?,
        Backend::Mongo => mongo::get_sprint(&state.mongo, &id).await?,
    };
    Ok(Html(views::sprint_page(backend, &sprint)))
}
