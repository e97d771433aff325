//! Declarative endpoint table for the task service.
//!
//! # Design
//! Every operation the backend exposes is a row in `Endpoint::route`: HTTP
//! method, path template, whether a bearer token is attached, whether the
//! success body is returned or discarded, and the message used when a
//! failure carries nothing better. The request path through `TaskClient` is
//! identical for all rows, so adding an endpoint means adding a variant and
//! a row, never a new code path.

use crate::http::HttpMethod;

/// Placeholder substituted with the target identifier.
pub const ID_PLACEHOLDER: &str = "{id}";

/// What to do with a 2xx response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Parse the body as JSON and hand it to the caller.
    ReturnBody,
    /// Ignore the body entirely, even if it is not JSON.
    Discard,
}

/// One row of the endpoint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub authenticated: bool,
    pub response: ResponseMode,
    pub default_message: &'static str,
}

impl Route {
    const fn new(
        method: HttpMethod,
        path: &'static str,
        authenticated: bool,
        response: ResponseMode,
        default_message: &'static str,
    ) -> Self {
        Self {
            method,
            path,
            authenticated,
            response,
            default_message,
        }
    }

    /// Whether the path template expects a target identifier.
    pub fn takes_id(&self) -> bool {
        self.path.contains(ID_PLACEHOLDER)
    }
}

/// Every operation of the task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    SignUp,
    Login,

    GetMe,
    RenameMe,
    ChangeMyPassword,
    DeleteMe,
    GetMyTasks,
    CreateNewTask,
    DeleteTask,
    SwitchTaskStatus,
    ChangeTaskTitle,
    ChangeTaskDescription,

    GetAllUsersAdmin,
    CreateNewUserAdmin,
    GetUserByIdAdmin,
    GetUserTasksAdmin,
    CreateNewTaskAdmin,
    RenameUserAdmin,
    ChangeUserPasswordAdmin,
    UpdateUserRoleAdmin,
    DeleteUserAdmin,
    GetAllTasksAdmin,
    DeleteTaskAdmin,
    SwitchTaskStatusAdmin,
    ChangeTaskTitleAdmin,
    ChangeTaskDescriptionAdmin,
}

impl Endpoint {
    pub const ALL: [Endpoint; 26] = [
        Endpoint::SignUp,
        Endpoint::Login,
        Endpoint::GetMe,
        Endpoint::RenameMe,
        Endpoint::ChangeMyPassword,
        Endpoint::DeleteMe,
        Endpoint::GetMyTasks,
        Endpoint::CreateNewTask,
        Endpoint::DeleteTask,
        Endpoint::SwitchTaskStatus,
        Endpoint::ChangeTaskTitle,
        Endpoint::ChangeTaskDescription,
        Endpoint::GetAllUsersAdmin,
        Endpoint::CreateNewUserAdmin,
        Endpoint::GetUserByIdAdmin,
        Endpoint::GetUserTasksAdmin,
        Endpoint::CreateNewTaskAdmin,
        Endpoint::RenameUserAdmin,
        Endpoint::ChangeUserPasswordAdmin,
        Endpoint::UpdateUserRoleAdmin,
        Endpoint::DeleteUserAdmin,
        Endpoint::GetAllTasksAdmin,
        Endpoint::DeleteTaskAdmin,
        Endpoint::SwitchTaskStatusAdmin,
        Endpoint::ChangeTaskTitleAdmin,
        Endpoint::ChangeTaskDescriptionAdmin,
    ];

    pub fn route(self) -> Route {
        use HttpMethod::{Delete, Get, Patch, Post};
        use ResponseMode::{Discard, ReturnBody};

        match self {
            Endpoint::SignUp => Route::new(Post, "/sign-up", false, Discard, "Failed to sign up"),
            Endpoint::Login => Route::new(Post, "/login", false, ReturnBody, "Failed to log in"),

            Endpoint::GetMe => Route::new(Get, "/me", true, ReturnBody, "Failed to load profile"),
            Endpoint::RenameMe => Route::new(
                Patch,
                "/me/rename",
                true,
                ReturnBody,
                "Failed to rename profile",
            ),
            Endpoint::ChangeMyPassword => Route::new(
                Patch,
                "/me/password",
                true,
                ReturnBody,
                "Failed to change password",
            ),
            Endpoint::DeleteMe => {
                Route::new(Delete, "/me", true, ReturnBody, "Failed to delete profile")
            }
            Endpoint::GetMyTasks => Route::new(
                Get,
                "/me/tasks",
                true,
                ReturnBody,
                "Failed to load your tasks",
            ),
            Endpoint::CreateNewTask => Route::new(
                Post,
                "/me/tasks",
                true,
                ReturnBody,
                "Failed to create new task",
            ),
            Endpoint::DeleteTask => Route::new(
                Delete,
                "/me/tasks/{id}",
                true,
                ReturnBody,
                "Failed to delete task",
            ),
            Endpoint::SwitchTaskStatus => Route::new(
                Patch,
                "/me/tasks/{id}/switch",
                true,
                ReturnBody,
                "Failed to switch task status",
            ),
            Endpoint::ChangeTaskTitle => Route::new(
                Patch,
                "/me/tasks/{id}/title",
                true,
                ReturnBody,
                "Failed to change task title",
            ),
            Endpoint::ChangeTaskDescription => Route::new(
                Patch,
                "/me/tasks/{id}/description",
                true,
                ReturnBody,
                "Failed to change task description",
            ),

            Endpoint::GetAllUsersAdmin => Route::new(
                Get,
                "/admin/users",
                true,
                ReturnBody,
                "Failed to get all users",
            ),
            Endpoint::CreateNewUserAdmin => Route::new(
                Post,
                "/admin/users",
                true,
                Discard,
                "Failed to create new user",
            ),
            Endpoint::GetUserByIdAdmin => Route::new(
                Get,
                "/admin/users/{id}",
                true,
                ReturnBody,
                "Failed to get user by ID",
            ),
            Endpoint::GetUserTasksAdmin => Route::new(
                Get,
                "/admin/users/{id}/tasks",
                true,
                ReturnBody,
                "Failed to get user's tasks",
            ),
            Endpoint::CreateNewTaskAdmin => Route::new(
                Post,
                "/admin/users/{id}/tasks",
                true,
                ReturnBody,
                "Failed to create new task",
            ),
            Endpoint::RenameUserAdmin => Route::new(
                Patch,
                "/admin/users/{id}/rename",
                true,
                ReturnBody,
                "Failed to rename user",
            ),
            Endpoint::ChangeUserPasswordAdmin => Route::new(
                Patch,
                "/admin/users/{id}/password",
                true,
                ReturnBody,
                "Failed to change user's password",
            ),
            Endpoint::UpdateUserRoleAdmin => Route::new(
                Patch,
                "/admin/users/{id}/role",
                true,
                ReturnBody,
                "Failed to update user's role",
            ),
            Endpoint::DeleteUserAdmin => Route::new(
                Delete,
                "/admin/users/{id}",
                true,
                ReturnBody,
                "Failed to delete user",
            ),
            Endpoint::GetAllTasksAdmin => Route::new(
                Get,
                "/admin/tasks",
                true,
                ReturnBody,
                "Failed to get all tasks",
            ),
            Endpoint::DeleteTaskAdmin => Route::new(
                Delete,
                "/admin/tasks/{id}",
                true,
                ReturnBody,
                "Failed to delete task",
            ),
            Endpoint::SwitchTaskStatusAdmin => Route::new(
                Patch,
                "/admin/tasks/{id}/switch",
                true,
                ReturnBody,
                "Failed to switch task status",
            ),
            Endpoint::ChangeTaskTitleAdmin => Route::new(
                Patch,
                "/admin/tasks/{id}/title",
                true,
                ReturnBody,
                "Failed to change task title",
            ),
            Endpoint::ChangeTaskDescriptionAdmin => Route::new(
                Patch,
                "/admin/tasks/{id}/description",
                true,
                ReturnBody,
                "Failed to change task description",
            ),
        }
    }
}
