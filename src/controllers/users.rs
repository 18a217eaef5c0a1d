//! Registration, login and logout.

use serde_json::{json, Value};

use crate::error::AppError;
use crate::models::User;
use crate::routing::{Construct, Controller, Operation, Outcome, RequestContext};

pub struct Users;

/// Submitted registration form and its field errors.
#[derive(Debug, Default)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
    confirm_password: String,
    name_err: String,
    email_err: String,
    password_err: String,
    confirm_password_err: String,
}

impl RegisterForm {
    fn is_valid(&self) -> bool {
        self.name_err.is_empty()
            && self.email_err.is_empty()
            && self.password_err.is_empty()
            && self.confirm_password_err.is_empty()
    }

    /// Passwords are never echoed back into the form.
    fn view_data(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "name_err": self.name_err,
            "email_err": self.email_err,
            "password_err": self.password_err,
            "confirm_password_err": self.confirm_password_err,
        })
    }
}

#[derive(Debug, Default)]
struct LoginForm {
    email: String,
    password: String,
    email_err: String,
    password_err: String,
}

impl LoginForm {
    fn view_data(&self) -> Value {
        json!({
            "email": self.email,
            "email_err": self.email_err,
            "password_err": self.password_err,
        })
    }
}

fn password_error(password: &str, min_len: usize) -> Option<String> {
    if password.is_empty() {
        Some("Please enter password".to_string())
    } else if password.chars().count() < min_len {
        Some(format!("Password must be at least {min_len} characters"))
    } else {
        None
    }
}

impl Users {
    fn register(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        if !ctx.is_post() {
            return Ok(Outcome::render("users/register", RegisterForm::default().view_data()));
        }

        let mut form = RegisterForm {
            name: ctx.field("name"),
            email: ctx.field("email"),
            password: ctx.field("password"),
            confirm_password: ctx.field("confirm_password"),
            ..RegisterForm::default()
        };
        let users = User::new(ctx.services.db.as_ref());

        if form.email.is_empty() {
            form.email_err = "Please enter email".into();
        } else if users.find_by_email(&form.email)? {
            form.email_err = "Email is already taken".into();
        }

        if form.name.is_empty() {
            form.name_err = "Please enter name".into();
        }

        if let Some(err) = password_error(&form.password, ctx.services.min_password_len) {
            form.password_err = err;
        }

        if form.confirm_password.is_empty() {
            form.confirm_password_err = "Please confirm password".into();
        } else if form.password != form.confirm_password {
            form.confirm_password_err = "Passwords do not match".into();
        }

        if !form.is_valid() {
            return Ok(Outcome::render("users/register", form.view_data()));
        }

        let hash = ctx.services.hasher.hash(&form.password)?;
        users.register(&form.name, &form.email, &hash)?;
        tracing::info!(email = %form.email, "User registered");

        ctx.session.flash("register_success", "You are registered and can log in");
        Ok(Outcome::redirect("users/login"))
    }

    fn login(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        if !ctx.is_post() {
            return Ok(Outcome::render("users/login", LoginForm::default().view_data()));
        }

        let mut form = LoginForm {
            email: ctx.field("email"),
            password: ctx.field("password"),
            ..LoginForm::default()
        };
        let users = User::new(ctx.services.db.as_ref());

        if form.email.is_empty() {
            form.email_err = "Please enter email".into();
        } else if !users.find_by_email(&form.email)? {
            form.email_err = "No user found".into();
        }

        if let Some(err) = password_error(&form.password, ctx.services.min_password_len) {
            form.password_err = err;
        }

        if !form.email_err.is_empty() || !form.password_err.is_empty() {
            return Ok(Outcome::render("users/login", form.view_data()));
        }

        match users.login(&form.email, &form.password, ctx.services.hasher.as_ref())? {
            Some(user) => {
                ctx.session.sign_in(user.id, &user.email, &user.name);
                tracing::info!(user_id = user.id, "User logged in");
                Ok(Outcome::redirect("posts"))
            }
            None => {
                form.password_err = "Password incorrect".into();
                Ok(Outcome::render("users/login", form.view_data()))
            }
        }
    }

    fn logout(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        if let Some(user_id) = ctx.session.user_id() {
            tracing::info!(user_id, "User logged out");
        }
        ctx.session.destroy();
        Ok(Outcome::redirect("users/login"))
    }
}

impl Controller for Users {
    const NAME: &'static str = "Users";
    const OPERATIONS: &'static [(&'static str, Operation<Self>)] = &[
        ("register", Users::register),
        ("login", Users::login),
        ("logout", Users::logout),
    ];

    fn construct(_ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
        Ok(Construct::Ready(Users))
    }
}
