//! Posts: listing, viewing and owner-only editing.
//!
//! Every operation requires a signed-in user; construction redirects
//! anonymous callers to the login page before any operation runs.

use serde_json::{json, Value};

use crate::controllers::id_param;
use crate::error::AppError;
use crate::models::{Post, PostRecord, User};
use crate::routing::{Construct, Controller, Operation, Outcome, RequestContext};

pub struct Posts {
    user_id: i64,
}

#[derive(Debug, Default)]
struct PostForm {
    title: String,
    body: String,
    title_err: String,
    body_err: String,
}

impl PostForm {
    fn from_request(ctx: &RequestContext<'_>) -> Self {
        let mut form = Self {
            title: ctx.field("title"),
            body: ctx.field("body"),
            ..Self::default()
        };
        if form.title.is_empty() {
            form.title_err = "Please enter a title".into();
        }
        if form.body.is_empty() {
            form.body_err = "Please enter body text".into();
        }
        form
    }

    fn is_valid(&self) -> bool {
        self.title_err.is_empty() && self.body_err.is_empty()
    }

    fn view_data(&self) -> Value {
        json!({
            "title": self.title,
            "body": self.body,
            "title_err": self.title_err,
            "body_err": self.body_err,
        })
    }
}

impl Posts {
    /// Load a post the current user owns; `Err(redirect)` otherwise.
    fn owned(&self, posts: &Post<'_>, id: i64) -> Result<Result<PostRecord, Outcome>, AppError> {
        let post = posts
            .find_by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
        if post.user_id != self.user_id {
            tracing::warn!(post_id = id, user_id = self.user_id, "Post owned by another user");
            return Ok(Err(Outcome::redirect("posts")));
        }
        Ok(Ok(post))
    }

    fn index(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        let posts = Post::new(ctx.services.db.as_ref()).all()?;
        Ok(Outcome::render("posts/index", json!({ "posts": posts })))
    }

    fn show(&mut self, ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
        let id = id_param(params, "show")?;
        let db = ctx.services.db.as_ref();
        let post = Post::new(db)
            .find_by_id(id)?
            .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
        let user = User::new(db).find_by_id(post.user_id)?;
        Ok(Outcome::render("posts/show", json!({ "post": post, "user": user })))
    }

    fn add(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
        if !ctx.is_post() {
            return Ok(Outcome::render("posts/add", PostForm::default().view_data()));
        }

        let form = PostForm::from_request(ctx);
        if !form.is_valid() {
            return Ok(Outcome::render("posts/add", form.view_data()));
        }

        let id = Post::new(ctx.services.db.as_ref()).add(self.user_id, &form.title, &form.body)?;
        tracing::info!(post_id = ?id, user_id = self.user_id, "Post added");
        ctx.session.flash("post_message", "Post has been added.");
        Ok(Outcome::redirect("posts"))
    }

    fn edit(&mut self, ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
        let id = id_param(params, "edit")?;
        let posts = Post::new(ctx.services.db.as_ref());
        let post = match self.owned(&posts, id)? {
            Ok(post) => post,
            Err(redirect) => return Ok(redirect),
        };

        if !ctx.is_post() {
            let mut data = PostForm {
                title: post.title,
                body: post.body,
                ..PostForm::default()
            }
            .view_data();
            data["id"] = json!(id);
            return Ok(Outcome::render("posts/edit", data));
        }

        let form = PostForm::from_request(ctx);
        if !form.is_valid() {
            let mut data = form.view_data();
            data["id"] = json!(id);
            return Ok(Outcome::render("posts/edit", data));
        }

        posts.update(id, &form.title, &form.body)?;
        tracing::info!(post_id = id, "Post updated");
        ctx.session.flash("post_message", "Post Updated");
        Ok(Outcome::redirect("posts"))
    }

    fn delete(&mut self, ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
        if !ctx.is_post() {
            return Ok(Outcome::redirect("posts"));
        }

        let id = id_param(params, "delete")?;
        let posts = Post::new(ctx.services.db.as_ref());
        if let Err(redirect) = self.owned(&posts, id)? {
            return Ok(redirect);
        }

        posts.delete(id)?;
        tracing::info!(post_id = id, "Post removed");
        ctx.session.flash("post_message", "Post Removed");
        Ok(Outcome::redirect("posts"))
    }
}

impl Controller for Posts {
    const NAME: &'static str = "Posts";
    const OPERATIONS: &'static [(&'static str, Operation<Self>)] = &[
        ("index", Posts::index),
        ("show", Posts::show),
        ("add", Posts::add),
        ("edit", Posts::edit),
        ("delete", Posts::delete),
    ];

    fn construct(ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
        match ctx.session.user_id() {
            Some(user_id) => Ok(Construct::Ready(Posts { user_id })),
            None => Ok(Construct::Halt(Outcome::redirect("users/login"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Services;
    use crate::session::Session;
    use axum::http::Method;
    use std::collections::HashMap;

    struct Fixture {
        services: Services,
        owner: i64,
        other: i64,
        post: i64,
    }

    fn fixture() -> Fixture {
        let services = Services::in_memory().unwrap();
        let db = services.db.as_ref();
        let owner = User::new(db).register("Doge", "doge@example.com", "x").unwrap().unwrap();
        let other = User::new(db).register("Cat", "cat@example.com", "x").unwrap().unwrap();
        let post = Post::new(db).add(owner, "Wow", "Such post").unwrap().unwrap();
        Fixture {
            services,
            owner,
            other,
            post,
        }
    }

    fn call(
        fx: &Fixture,
        user_id: i64,
        method: Method,
        op: Operation<Posts>,
        params: &[&str],
        fields: &[(&str, &str)],
    ) -> (Result<Outcome, AppError>, Session) {
        let mut session = Session::new("s");
        session.sign_in(user_id, "u@example.com", "U");
        let form: HashMap<String, String> =
            fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let result = {
            let mut ctx = RequestContext::new(method, &mut session, &fx.services).with_form(form);
            op(&mut Posts { user_id }, &mut ctx, &params)
        };
        (result, session)
    }

    #[test]
    fn test_construct_requires_login() {
        let services = Services::in_memory().unwrap();
        let mut session = Session::new("anon");
        let mut ctx = RequestContext::new(Method::GET, &mut session, &services);
        assert!(matches!(
            Posts::construct(&mut ctx).unwrap(),
            Construct::Halt(Outcome::Redirect(to)) if to == "users/login"
        ));
    }

    #[test]
    fn test_index_lists_posts() {
        let fx = fixture();
        let (outcome, _) = call(&fx, fx.owner, Method::GET, Posts::index, &[], &[]);
        let Outcome::Render(view) = outcome.unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.name, "posts/index");
        assert_eq!(view.data["posts"][0]["author"], json!("Doge"));
    }

    #[test]
    fn test_show() {
        let fx = fixture();
        let id = fx.post.to_string();
        let (outcome, _) = call(&fx, fx.other, Method::GET, Posts::show, &[&id], &[]);
        let Outcome::Render(view) = outcome.unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.data["post"]["title"], json!("Wow"));
        assert_eq!(view.data["user"]["name"], json!("Doge"));

        let (outcome, _) = call(&fx, fx.owner, Method::GET, Posts::show, &["999"], &[]);
        assert!(matches!(outcome, Err(AppError::NotFound(_))));

        let (outcome, _) = call(&fx, fx.owner, Method::GET, Posts::show, &[], &[]);
        assert!(matches!(outcome, Err(AppError::MissingParameter { .. })));
    }

    #[test]
    fn test_add_validates_then_inserts() {
        let fx = fixture();
        let (outcome, _) = call(&fx, fx.owner, Method::POST, Posts::add, &[], &[("title", "Hi")]);
        let Outcome::Render(view) = outcome.unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.data["title"], json!("Hi"));
        assert_eq!(view.data["body_err"], json!("Please enter body text"));

        let (outcome, mut session) = call(
            &fx,
            fx.owner,
            Method::POST,
            Posts::add,
            &[],
            &[("title", "Hi"), ("body", "There")],
        );
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));
        assert_eq!(session.take_flashes()["post_message"].message, "Post has been added.");
        assert_eq!(Post::new(fx.services.db.as_ref()).all().unwrap().len(), 2);
    }

    #[test]
    fn test_edit_by_owner() {
        let fx = fixture();
        let id = fx.post.to_string();

        let (outcome, _) = call(&fx, fx.owner, Method::GET, Posts::edit, &[&id], &[]);
        let Outcome::Render(view) = outcome.unwrap() else {
            panic!("expected render");
        };
        assert_eq!(view.data["id"], json!(fx.post));
        assert_eq!(view.data["title"], json!("Wow"));

        let (outcome, _) = call(
            &fx,
            fx.owner,
            Method::POST,
            Posts::edit,
            &[&id],
            &[("title", "Wow!"), ("body", "Edited")],
        );
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));
        let post = Post::new(fx.services.db.as_ref()).find_by_id(fx.post).unwrap().unwrap();
        assert_eq!(post.title, "Wow!");
    }

    #[test]
    fn test_edit_and_delete_by_other_user_redirect() {
        let fx = fixture();
        let id = fx.post.to_string();

        let (outcome, _) = call(
            &fx,
            fx.other,
            Method::POST,
            Posts::edit,
            &[&id],
            &[("title", "Hacked"), ("body", "Hacked")],
        );
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));

        let (outcome, _) = call(&fx, fx.other, Method::POST, Posts::delete, &[&id], &[]);
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));

        let post = Post::new(fx.services.db.as_ref()).find_by_id(fx.post).unwrap().unwrap();
        assert_eq!(post.title, "Wow");
    }

    #[test]
    fn test_delete_requires_post_and_owner() {
        let fx = fixture();
        let id = fx.post.to_string();

        let (outcome, _) = call(&fx, fx.owner, Method::GET, Posts::delete, &[&id], &[]);
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));
        assert!(Post::new(fx.services.db.as_ref()).find_by_id(fx.post).unwrap().is_some());

        let (outcome, mut session) = call(&fx, fx.owner, Method::POST, Posts::delete, &[&id], &[]);
        assert_eq!(outcome.unwrap(), Outcome::redirect("posts"));
        assert_eq!(session.take_flashes()["post_message"].message, "Post Removed");
        assert!(Post::new(fx.services.db.as_ref()).find_by_id(fx.post).unwrap().is_none());
    }
}
