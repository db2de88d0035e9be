use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use serde::Deserialize;
use rs_predict_core::io::{get_filename, list_files, normalize_folder};
use rs_predict_core::model::predictor::Predictor;
use rs_predict_core::model::registry::load_model;
use rs_predict_core::model::trie_model::TrieModel;

/// Struct representing query parameters for the `/v1/predict` endpoint
#[derive(Deserialize)]
struct PredictParams {
	context: Option<String>,
	k: Option<usize>
}

#[derive(Deserialize)]
struct ModelQuery {
	name: Option<String>
}

struct SharedData {
	predictor: Option<Predictor<TrieModel>>,
	model_name: Option<String>
}

/// HTTP GET endpoint `/v1/predict`
///
/// Seeds a fresh context from the whitespace-separated `context` words
/// (unknown words are skipped) and returns the top-k predictions as a
/// JSON array of `{word, log_prob}`, best first.
#[get("/v1/predict")]
async fn get_predictions(data: web::Data<Mutex<SharedData>>, query: web::Query<PredictParams>) -> impl Responder {
	let k = query.k.unwrap_or(5);

	let context = match &query.context {
		Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
		_ => return HttpResponse::BadRequest().body("Missing or empty context"),
	};

	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let predictor = match &shared_data.predictor {
		Some(p) => p,
		None => return HttpResponse::ServiceUnavailable().body("No model loaded"),
	};

	let mut state = predictor.initial_state();
	for word in context.split_whitespace() {
		// Default policy skips unknown words, so this cannot fail.
		if let Err(e) = predictor.feed(&mut state, word) {
			return HttpResponse::InternalServerError().body(e);
		}
	}

	HttpResponse::Ok().json(predictor.predict(&state, k))
}

#[get("/v1/models")]
async fn get_models() -> impl Responder {
	match list_files(normalize_folder("./data"), "bin") {
		Ok(files) => HttpResponse::Ok().body(files.join("\n").replace(".bin", "")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models")
	}
}

#[get("/v1/loaded_model")]
async fn get_loaded_model(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	match &shared_data.model_name {
		Some(name) => HttpResponse::Ok().body(name.to_owned()),
		None => HttpResponse::NotFound().body("No model loaded")
	}
}

#[put("/v1/load_model")]
async fn put_model(data: web::Data<Mutex<SharedData>>, query: web::Query<ModelQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let name = match &query.name {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_path = format!("./data/{}.bin", name);
	let model = match load_model(&model_path) {
		Ok(m) => m,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to load model: {e}"))
	};
	let predictor = match Predictor::new(model) {
		Ok(p) => p,
		Err(e) => return HttpResponse::InternalServerError().body(format!("Failed to build predictor: {e}"))
	};

	shared_data.model_name = get_filename(&model_path).ok();
	shared_data.predictor = Some(predictor);

	HttpResponse::Ok().body("Model loaded successfully")
}

/// Main entry point for the server.
///
/// Starts with no model loaded; `PUT /v1/load_model` resolves a `.bin`
/// file from `./data` through the typed registry and swaps the shared
/// predictor behind a `Mutex`.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000.
/// - Currently, the data directory is hardcoded and should be made configurable.
/// - WIP: Additional endpoints, error handling, and logging may be added.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	let shared_data = SharedData {
		predictor: None,
		model_name: None,
	};
	let shared_model = web::Data::new(Mutex::new(shared_data));

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_predictions)
			.service(get_models)
			.service(put_model)
			.service(get_loaded_model)
	})
		.bind(("127.0.0.1", 5000))?
		.run()
		.await
}
