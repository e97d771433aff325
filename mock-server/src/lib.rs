use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request, State,
    },
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ADMIN: &str = "admin";
pub const USER: &str = "user";

const MIN_PASSWORD_LEN: usize = 7;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Rename {
    pub name: String,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct TitleUpdate {
    pub title: String,
}

#[derive(Deserialize)]
pub struct DescriptionUpdate {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub id: u64,
    pub status: &'static str,
}

/// An error answered as `{"message": ...}`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, reason = %self.message, "request rejected");
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, Failure>;

/// A JSON request body. Rejections are answered as `Failure`.
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Failure::new(e.status(), e.body_text()))?;
        Ok(Self(value))
    }
}

/// The numeric `{id}` segment of a route.
pub struct Id(pub u64);

impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(malformed_id)?;
        Ok(Self(id))
    }
}

fn malformed_id(rejection: PathRejection) -> Failure {
    Failure::bad_request(format!("malformed id: {}", rejection.body_text()))
}

struct Account {
    user: User,
    password: String,
}

/// Users, tasks and issued tokens.
///
/// Every login adds a token. Tokens never expire and are dropped only
/// together with their user.
#[derive(Default)]
pub struct Store {
    accounts: BTreeMap<u64, Account>,
    tasks: BTreeMap<u64, Task>,
    tokens: BTreeMap<String, u64>,
    next_user_id: u64,
    next_task_id: u64,
}

impl Store {
    fn create_user(&mut self, name: &str, password: &str, role: &str) -> ApiResult<u64> {
        if name.is_empty() {
            return Err(Failure::bad_request(
                "the length of name must be greater than 0",
            ));
        }
        check_password(password)?;
        if self.accounts.values().any(|a| a.user.name == name) {
            return Err(Failure::bad_request("user with this name already exists"));
        }
        self.next_user_id += 1;
        let id = self.next_user_id;
        let user = User {
            id,
            name: name.to_string(),
            role: role.to_string(),
        };
        self.accounts.insert(
            id,
            Account {
                user,
                password: password.to_string(),
            },
        );
        Ok(id)
    }

    fn login(&mut self, name: &str, password: &str) -> ApiResult<String> {
        let id = self
            .accounts
            .values()
            .find(|a| a.user.name == name && a.password == password)
            .map(|a| a.user.id)
            .ok_or_else(|| Failure::unauthorized("bad credentials"))?;
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), id);
        Ok(token)
    }

    fn caller(&self, headers: &HeaderMap) -> ApiResult<User> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| Failure::unauthorized("missing bearer token"))?;
        self.tokens
            .get(token)
            .and_then(|id| self.accounts.get(id))
            .map(|a| a.user.clone())
            .ok_or_else(|| Failure::unauthorized("invalid token"))
    }

    fn admin(&self, headers: &HeaderMap) -> ApiResult<User> {
        let user = self.caller(headers)?;
        if user.role != ADMIN {
            return Err(Failure::new(
                StatusCode::FORBIDDEN,
                "This is for admins only!",
            ));
        }
        Ok(user)
    }

    fn account_mut(&mut self, id: u64) -> ApiResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| Failure::not_found("user not found"))
    }

    fn user(&self, id: u64) -> ApiResult<User> {
        self.accounts
            .get(&id)
            .map(|a| a.user.clone())
            .ok_or_else(|| Failure::not_found("user not found"))
    }

    fn rename_user(&mut self, id: u64, name: &str) -> ApiResult<()> {
        if name.is_empty() {
            return Err(Failure::bad_request(
                "the length of name must be greater than 0",
            ));
        }
        if self.accounts.values().any(|a| a.user.name == name && a.user.id != id) {
            return Err(Failure::bad_request("user with this name already exists"));
        }
        self.account_mut(id)?.user.name = name.to_string();
        Ok(())
    }

    fn change_password(&mut self, id: u64, old: &str, new: &str) -> ApiResult<()> {
        let account = self.account_mut(id)?;
        if account.password != old {
            return Err(Failure::bad_request("old password is incorrect"));
        }
        if old == new {
            return Err(Failure::bad_request(
                "new password must be different from old password",
            ));
        }
        check_password(new)?;
        account.password = new.to_string();
        Ok(())
    }

    fn toggle_role(&mut self, id: u64) -> ApiResult<()> {
        let user = &mut self.account_mut(id)?.user;
        let role = if user.role == ADMIN { USER } else { ADMIN };
        user.role = role.to_string();
        Ok(())
    }

    fn delete_user(&mut self, id: u64) -> ApiResult<()> {
        self.accounts
            .remove(&id)
            .ok_or_else(|| Failure::not_found("user not found"))?;
        self.tasks.retain(|_, t| t.user_id != id);
        self.tokens.retain(|_, user_id| *user_id != id);
        Ok(())
    }

    fn tasks_of(&self, user_id: u64) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    fn create_task(&mut self, user_id: u64, input: NewTask) -> ApiResult<Task> {
        self.user(user_id)?;
        if input.title.is_empty() {
            return Err(Failure::bad_request("title must be not empty"));
        }
        self.next_task_id += 1;
        let task = Task {
            id: self.next_task_id,
            user_id,
            title: input.title,
            description: input.description,
            is_completed: false,
        };
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    /// A task, restricted to `owner`'s tasks when one is given.
    fn task_mut(&mut self, id: u64, owner: Option<u64>) -> ApiResult<&mut Task> {
        self.tasks
            .get_mut(&id)
            .filter(|t| owner.map_or(true, |o| t.user_id == o))
            .ok_or_else(|| Failure::not_found("task not found"))
    }

    fn delete_task(&mut self, id: u64, owner: Option<u64>) -> ApiResult<()> {
        self.task_mut(id, owner)?;
        self.tasks.remove(&id);
        Ok(())
    }
}

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Failure::bad_request(
            "the length of a password must be greater than 6 symbols",
        ));
    }
    Ok(())
}

fn retitle(task: &mut Task, title: String) -> ApiResult<Task> {
    if title.is_empty() {
        return Err(Failure::bad_request("title must be not empty"));
    }
    task.title = title;
    Ok(task.clone())
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Store::default())
}

/// An app whose store starts with one administrator account.
pub fn app_with_admin(name: &str, password: &str) -> Router {
    let mut store = Store::default();
    if let Err(failure) = store.create_user(name, password, ADMIN) {
        tracing::warn!(reason = %failure.message, "admin account not seeded");
    }
    router(store)
}

fn router(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/login", post(login))
        .route("/me", get(get_me).delete(delete_me))
        .route("/me/rename", patch(rename_me))
        .route("/me/password", patch(change_my_password))
        .route("/me/tasks", get(get_my_tasks).post(create_my_task))
        .route("/me/tasks/{id}", delete(delete_my_task))
        .route("/me/tasks/{id}/switch", patch(switch_my_task))
        .route("/me/tasks/{id}/title", patch(retitle_my_task))
        .route("/me/tasks/{id}/description", patch(describe_my_task))
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{id}", get(get_user).delete(delete_user))
        .route("/admin/users/{id}/rename", patch(rename_user))
        .route("/admin/users/{id}/password", patch(change_user_password))
        .route("/admin/users/{id}/role", patch(update_role))
        .route(
            "/admin/users/{id}/tasks",
            get(get_user_tasks).post(create_user_task),
        )
        .route("/admin/tasks", get(list_tasks))
        .route("/admin/tasks/{id}", delete(delete_any_task))
        .route("/admin/tasks/{id}/switch", patch(switch_any_task))
        .route("/admin/tasks/{id}/title", patch(retitle_any_task))
        .route("/admin/tasks/{id}/description", patch(describe_any_task))
        .fallback(unknown_route)
        .method_not_allowed_fallback(unsupported_method)
        .with_state(db)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn unknown_route() -> Failure {
    Failure::not_found("no such route")
}

async fn unsupported_method() -> Failure {
    Failure::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

// --- authentication ---

async fn sign_up(
    State(db): State<Db>,
    Body(input): Body<Credentials>,
) -> ApiResult<(StatusCode, Json<Ack>)> {
    let mut store = db.write().await;
    let id = store.create_user(&input.name, &input.password, USER)?;
    Ok((
        StatusCode::CREATED,
        Json(Ack {
            id,
            status: "User successfully created",
        }),
    ))
}

async fn login(
    State(db): State<Db>,
    Body(input): Body<Credentials>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = db.write().await.login(&input.name, &input.password)?;
    Ok(Json(json!({ "token": token })))
}

// --- self service ---

async fn get_me(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<User>> {
    let store = db.read().await;
    store.caller(&headers).map(Json)
}

async fn rename_me(
    State(db): State<Db>,
    headers: HeaderMap,
    Body(input): Body<Rename>,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    store.rename_user(me.id, &input.name)?;
    Ok(Json(Ack {
        id: me.id,
        status: "User successfully renamed",
    }))
}

async fn change_my_password(
    State(db): State<Db>,
    headers: HeaderMap,
    Body(input): Body<PasswordChange>,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    store.change_password(me.id, &input.old_password, &input.new_password)?;
    Ok(Json(Ack {
        id: me.id,
        status: "Password successfully changed",
    }))
}

async fn delete_me(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    store.delete_user(me.id)?;
    Ok(Json(Ack {
        id: me.id,
        status: "User successfully deleted",
    }))
}

async fn get_my_tasks(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Task>>> {
    let store = db.read().await;
    let me = store.caller(&headers)?;
    Ok(Json(store.tasks_of(me.id)))
}

async fn create_my_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Body(input): Body<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    let task = store.create_task(me.id, input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn delete_my_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    store.delete_task(id, Some(me.id))?;
    Ok(Json(Ack {
        id,
        status: "Task successfully deleted",
    }))
}

async fn switch_my_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    let task = store.task_mut(id, Some(me.id))?;
    task.is_completed = !task.is_completed;
    Ok(Json(task.clone()))
}

async fn retitle_my_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<TitleUpdate>,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    retitle(store.task_mut(id, Some(me.id))?, input.title).map(Json)
}

async fn describe_my_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<DescriptionUpdate>,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    let me = store.caller(&headers)?;
    let task = store.task_mut(id, Some(me.id))?;
    task.description = input.description;
    Ok(Json(task.clone()))
}

// --- administration: users ---

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<User>>> {
    let store = db.read().await;
    store.admin(&headers)?;
    let users = store.accounts.values().map(|a| a.user.clone()).collect();
    Ok(Json(users))
}

async fn create_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Body(input): Body<Credentials>,
) -> ApiResult<(StatusCode, Json<Ack>)> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    let id = store.create_user(&input.name, &input.password, USER)?;
    Ok((
        StatusCode::CREATED,
        Json(Ack {
            id,
            status: "User successfully created",
        }),
    ))
}

async fn get_user(State(db): State<Db>, headers: HeaderMap, Id(id): Id) -> ApiResult<Json<User>> {
    let store = db.read().await;
    store.admin(&headers)?;
    store.user(id).map(Json)
}

async fn rename_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<Rename>,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    store.rename_user(id, &input.name)?;
    Ok(Json(Ack {
        id,
        status: "User successfully renamed",
    }))
}

async fn change_user_password(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<PasswordChange>,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    store.change_password(id, &input.old_password, &input.new_password)?;
    Ok(Json(Ack {
        id,
        status: "Password successfully changed",
    }))
}

async fn update_role(State(db): State<Db>, headers: HeaderMap, Id(id): Id) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    store.toggle_role(id)?;
    Ok(Json(Ack {
        id,
        status: "Role successfully updated",
    }))
}

async fn delete_user(State(db): State<Db>, headers: HeaderMap, Id(id): Id) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    store.delete_user(id)?;
    Ok(Json(Ack {
        id,
        status: "User successfully deleted",
    }))
}

async fn get_user_tasks(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
) -> ApiResult<Json<Vec<Task>>> {
    let store = db.read().await;
    store.admin(&headers)?;
    store.user(id)?;
    Ok(Json(store.tasks_of(id)))
}

async fn create_user_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    let task = store.create_task(id, input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

// --- administration: tasks ---

async fn list_tasks(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Task>>> {
    let store = db.read().await;
    store.admin(&headers)?;
    Ok(Json(store.tasks.values().cloned().collect()))
}

async fn delete_any_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
) -> ApiResult<Json<Ack>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    store.delete_task(id, None)?;
    Ok(Json(Ack {
        id,
        status: "Task successfully deleted",
    }))
}

async fn switch_any_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    let task = store.task_mut(id, None)?;
    task.is_completed = !task.is_completed;
    Ok(Json(task.clone()))
}

async fn retitle_any_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<TitleUpdate>,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    retitle(store.task_mut(id, None)?, input.title).map(Json)
}

async fn describe_any_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Id(id): Id,
    Body(input): Body<DescriptionUpdate>,
) -> ApiResult<Json<Task>> {
    let mut store = db.write().await;
    store.admin(&headers)?;
    let task = store.task_mut(id, None)?;
    task.description = input.description;
    Ok(Json(task.clone()))
}
