use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::accounts::Accounts;
use crate::catalog::Catalog;
use crate::config::Environment;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AdminSecretGate;
use crate::models::{
    AddProductInput, AdminCreateInput, AdminLoginInput, DeleteAllInput, RemoveProductInput,
    SignInInput, SignUpInput,
};

/// Registers every route. Callers provide `Catalog`, `Accounts` and
/// `Environment` as app data.
pub fn configure(admin_secret: Option<String>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .route("/", web::get().to(index))
            .route("/add_product", web::post().to(add_product))
            .route("/delete_all_product", web::delete().to(delete_all_products))
            .route("/remove_product", web::delete().to(remove_product))
            .route("/all_product", web::get().to(all_products))
            .route("/product/{id}", web::get().to(get_product))
            .route("/signup", web::post().to(sign_up))
            .route("/login", web::post().to(sign_in))
            .service(
                web::scope("/admin")
                    .route("", web::get().to(admin_index))
                    .route("/login", web::post().to(admin_login))
                    .service(
                        web::resource("/create")
                            .wrap(AdminSecretGate::new(admin_secret))
                            .route(web::post().to(create_admin)),
                    ),
            );
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(format!("Invalid JSON body: {}", err)).into())
}

async fn index(env: web::Data<Environment>) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body(format!(
        "<title>Server API</title>\n<p>App is running</p>\n<p>APP_ENV = {}</p>\n",
        env.as_str()
    ))
}

async fn admin_index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html")
        .body("<title>Admin API</title>\n<p>Admin API</p>\n<p>Nothing to see here</p>\n")
}

async fn add_product(
    catalog: web::Data<Catalog>,
    data: web::Json<AddProductInput>,
) -> ApiResult<HttpResponse> {
    let saved = catalog.add_product(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "id": saved.id,
        "name": saved.name,
        "category": saved.category,
        "available": saved.available,
        "count": saved.count,
    })))
}

// A missing or unreadable body counts as a missing password.
async fn delete_all_products(
    catalog: web::Data<Catalog>,
    data: Option<web::Json<DeleteAllInput>>,
) -> ApiResult<HttpResponse> {
    let password = data.as_ref().and_then(|d| d.password.as_deref());
    catalog.delete_all_products(password).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "message": "All products deleted successfully",
    })))
}

async fn remove_product(
    catalog: web::Data<Catalog>,
    data: web::Json<RemoveProductInput>,
) -> ApiResult<HttpResponse> {
    let id = catalog.remove_product(data.id.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "id": id,
        "message": "Product deleted successfully",
    })))
}

async fn all_products(catalog: web::Data<Catalog>) -> ApiResult<HttpResponse> {
    let products = catalog.list_products().await?;
    let message = if products.is_empty() {
        "No products found"
    } else {
        "Products found"
    };
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "message": message,
        "all_product": products,
    })))
}

async fn get_product(
    catalog: web::Data<Catalog>,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    // A non-numeric id cannot match any product.
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::NotFound("Product not found".to_string()))?;
    let product = catalog.get_product(id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "message": "Product found",
        "product": product,
    })))
}

async fn sign_up(
    accounts: web::Data<Accounts>,
    data: web::Json<SignUpInput>,
) -> ApiResult<HttpResponse> {
    let token = accounts.sign_up(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": 1, "token": token })))
}

async fn sign_in(
    accounts: web::Data<Accounts>,
    data: web::Json<SignInInput>,
) -> ApiResult<HttpResponse> {
    let token = accounts.sign_in(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": 1, "token": token })))
}

async fn create_admin(
    accounts: web::Data<Accounts>,
    data: web::Json<AdminCreateInput>,
) -> ApiResult<HttpResponse> {
    let username = accounts.create_admin(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "message": "Admin user created",
        "username": username,
    })))
}

async fn admin_login(
    accounts: web::Data<Accounts>,
    data: web::Json<AdminLoginInput>,
) -> ApiResult<HttpResponse> {
    accounts.admin_login(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": 1,
        "message": "Login successful",
    })))
}
