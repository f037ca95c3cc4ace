//! Operator commands.

use chrono::NaiveDate;
use desk_core::lifecycle;
use desk_core::{Desk, FetchScope, QuoteCart};
use desk_types::{
	validate_template, Establishment, ListQuery, Notice, QuotationRecord, RecordRef, RecordStatus,
	Role, ServiceRecord,
};
use std::error::Error;
use std::future::Future;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

type CommandResult = Result<(), Box<dyn Error>>;

/// Filters shared by the list commands.
#[derive(clap::Args, Debug)]
pub struct ListArgs {
	#[arg(long)]
	search: Option<String>,
	#[arg(long)]
	status: Option<RecordStatus>,
	/// First day to include (YYYY-MM-DD)
	#[arg(long)]
	from: Option<NaiveDate>,
	/// Last day to include (YYYY-MM-DD)
	#[arg(long)]
	to: Option<NaiveDate>,
	#[arg(long)]
	page: Option<u32>,
}

impl From<ListArgs> for ListQuery {
	fn from(args: ListArgs) -> Self {
		ListQuery {
			search: args.search,
			status: args.status,
			date_from: args.from,
			date_to: args.to,
			page: args.page,
			limit: None,
		}
	}
}

fn fail(notice: Notice) -> Box<dyn Error> {
	notice.to_string().into()
}

fn require_session(desk: &Desk) -> CommandResult {
	if desk.session().is_signed_in() {
		Ok(())
	} else {
		Err(fail(Notice::warning(
			"No hay una sesión activa. Inicia sesión con `desk login`.",
		)))
	}
}

/// Runs a fetch that Ctrl-C abandons. A result arriving after that is dropped.
async fn fetch<F: Future>(scope: &FetchScope, fut: F) -> Option<F::Output> {
	tokio::select! {
		output = scope.run(fut) => output,
		_ = tokio::signal::ctrl_c() => {
			scope.close();
			None
		}
	}
}

async fn load_cart(path: &Path) -> Result<QuoteCart, Box<dyn Error>> {
	let contents = tokio::fs::read_to_string(path).await?;
	Ok(serde_json::from_str(&contents)?)
}

pub async fn total(desk: &Desk, path: &Path) -> CommandResult {
	let saved = load_cart(path).await?;

	let store = desk.cart();
	store.clear();
	for product in saved.products() {
		store.add_product(product.clone());
	}
	store.set_establishments(saved.establishments().to_vec());

	let cart = store.snapshot();
	println!(
		"{} productos, {} establecimientos",
		cart.product_count(),
		cart.establishments().len()
	);
	println!("Total: ${}", store.total());
	Ok(())
}

pub fn transitions(role: Role, status: RecordStatus) {
	for line in transition_lines(role, status) {
		println!("{}", line);
	}
}

fn transition_lines(role: Role, status: RecordStatus) -> Vec<String> {
	let offered = lifecycle::offered_transitions(role, status);
	if offered.is_empty() {
		return vec![format!("{} ({}): sin cambios disponibles", status.label(), role)];
	}

	offered
		.iter()
		.map(|to| match lifecycle::transition_warning(status, *to) {
			Some(warning) => format!("{} -> {}  ({})", status.label(), to.label(), warning),
			None => format!("{} -> {}", status.label(), to.label()),
		})
		.collect()
}

pub async fn login(desk: &Desk, email: &str, password: &str) -> CommandResult {
	let session = desk
		.session()
		.login(email, password)
		.await
		.map_err(|e| fail(e.notice()))?;
	println!(
		"{}",
		Notice::success(format!("Sesión iniciada como {} ({})", session.user.name, session.role()))
	);
	Ok(())
}

pub async fn logout(desk: &Desk) -> CommandResult {
	desk.session().logout().await.map_err(|e| fail(e.notice()))?;
	println!("{}", Notice::success("Sesión cerrada"));
	Ok(())
}

pub async fn list_quotations(desk: &Desk, args: ListArgs) -> CommandResult {
	require_session(desk)?;
	let scope = desk.fetch_scope();
	let query = ListQuery::from(args);

	let Some(result) = fetch(&scope, desk.workflow().list_quotations(&query)).await else {
		return Ok(());
	};
	let page = result.map_err(|e| fail(e.notice()))?;

	for quotation in &page.items {
		println!("{}", quotation_row(quotation));
	}
	println!("{} de {} cotizaciones", page.items.len(), page.total);
	Ok(())
}

pub async fn list_services(desk: &Desk, args: ListArgs) -> CommandResult {
	require_session(desk)?;
	let scope = desk.fetch_scope();
	let query = ListQuery::from(args);

	let Some(result) = fetch(&scope, desk.workflow().list_services(&query)).await else {
		return Ok(());
	};
	let page = result.map_err(|e| fail(e.notice()))?;

	for service in &page.items {
		println!("{}", service_row(service));
	}
	println!("{} de {} servicios", page.items.len(), page.total);
	Ok(())
}

pub async fn show_quotation(desk: &Desk, id: &str) -> CommandResult {
	require_session(desk)?;
	let scope = desk.fetch_scope();
	let client = desk.client();

	let Some(result) = fetch(&scope, async {
		tokio::try_join!(client.get_quotation(id), client.quotation_log(id))
	})
	.await
	else {
		return Ok(());
	};
	let (quotation, log) = result.map_err(|e| fail(Notice::from(&e)))?;

	println!("{}", quotation_row(&quotation));
	println!(
		"Subtotal ${}  IVA ${}  Total ${}",
		quotation.subtotal, quotation.tax, quotation.total
	);
	for establishment in &quotation.establishments {
		println!("  Establecimiento: {}", establishment.name);
	}
	for product in &quotation.products {
		println!("  Producto: {} ({} campos)", product.name, product.fields.len());
		// Listings may omit field definitions
		if product.fields.is_empty() {
			continue;
		}
		if let Err(errors) = validate_template(&product.fields) {
			println!("    {}", Notice::warning(errors.to_string()));
		}
	}

	let status = quotation.status;
	let actions: Vec<&str> = [
		lifecycle::can_edit(status).then_some("editar"),
		lifecycle::can_delete(status).then_some("eliminar"),
	]
	.into_iter()
	.flatten()
	.collect();
	if !actions.is_empty() {
		println!("Acciones: {}", actions.join(", "));
	}
	for line in transition_lines(desk.role(), status) {
		println!("  {}", line);
	}

	if !log.is_empty() {
		println!("Bitácora:");
		for entry in &log {
			println!(
				"  {} {} {}",
				entry.created_at.format("%Y-%m-%d %H:%M"),
				entry.user_name.as_deref().unwrap_or("-"),
				entry.action
			);
		}
	}
	Ok(())
}

pub async fn transition_quotation(
	desk: &Desk,
	id: &str,
	to: RecordStatus,
	comment: Option<String>,
) -> CommandResult {
	require_session(desk)?;
	let quotation = desk
		.client()
		.get_quotation(id)
		.await
		.map_err(|e| fail(Notice::from(&e)))?;
	change_status(desk, quotation.to_ref(), to, comment).await
}

pub async fn transition_service(
	desk: &Desk,
	id: &str,
	to: RecordStatus,
	comment: Option<String>,
) -> CommandResult {
	require_session(desk)?;
	let service = desk
		.client()
		.get_service(id)
		.await
		.map_err(|e| fail(Notice::from(&e)))?;
	change_status(desk, service.to_ref(), to, comment).await
}

async fn change_status(
	desk: &Desk,
	record: RecordRef,
	to: RecordStatus,
	comment: Option<String>,
) -> CommandResult {
	let outcome = desk
		.workflow()
		.change_status(desk.role(), &record, to, comment)
		.await
		.map_err(|e| fail(e.notice()))?;

	if let Some(warning) = outcome.warning {
		println!("{}", Notice::warning(warning));
	}
	println!("{}", outcome.notice());
	Ok(())
}

pub async fn delete_quotation(desk: &Desk, id: &str) -> CommandResult {
	require_session(desk)?;
	let quotation = desk
		.client()
		.get_quotation(id)
		.await
		.map_err(|e| fail(Notice::from(&e)))?;

	let outcome = desk
		.workflow()
		.delete(&quotation.to_ref())
		.await
		.map_err(|e| fail(e.notice()))?;
	println!("{}", outcome.notice());
	Ok(())
}

/// Interactive establishment search over stdin, one query per line.
///
/// Queries are debounced with the configured window. A newer query cancels
/// the search still in flight, so only current results are printed.
pub async fn search_establishments(desk: &Desk) -> CommandResult {
	require_session(desk)?;
	let (debouncer, mut settled) = desk.search_debouncer::<String>();
	let mut scope = desk.fetch_scope();
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut in_flight = None;

	loop {
		tokio::select! {
			line = lines.next_line() => match line? {
				Some(line) => debouncer.trigger(line),
				None => break,
			},
			Some(term) = settled.recv() => {
				in_flight = Some(spawn_search(desk, &mut scope, term));
			}
		}
	}

	// Input ended: let the last query settle before leaving
	let window = desk.config().debounce();
	if let Ok(Some(term)) = tokio::time::timeout(window * 2, settled.recv()).await {
		in_flight = Some(spawn_search(desk, &mut scope, term));
	}
	if let Some(handle) = in_flight {
		if let Err(e) = handle.await {
			tracing::warn!(error = %e, "Establishment search task failed");
		}
	}
	Ok(())
}

fn spawn_search(desk: &Desk, scope: &mut FetchScope, term: String) -> JoinHandle<Option<()>> {
	scope.restart();
	let workflow = desk.workflow().clone();
	scope.spawn(async move {
		match workflow.search_establishments(&term).await {
			Ok(found) => {
				for line in establishment_lines(&term, &found) {
					println!("{}", line);
				}
			}
			Err(e) => println!("{}", e.notice()),
		}
	})
}

fn establishment_lines(term: &str, found: &[Establishment]) -> Vec<String> {
	if term.trim().is_empty() {
		return Vec::new();
	}
	if found.is_empty() {
		return vec![format!("Sin resultados para \"{}\"", term.trim())];
	}
	found
		.iter()
		.map(|establishment| {
			format!(
				"{:<10} {} {}",
				establishment.id,
				establishment.name,
				establishment.city.as_deref().unwrap_or("")
			)
			.trim_end()
			.to_string()
		})
		.collect()
}

fn quotation_row(quotation: &QuotationRecord) -> String {
	format!(
		"{:<12} {:<12} {:>12} {}",
		quotation.folio,
		quotation.status.label(),
		format!("${}", quotation.total),
		quotation.created_at.format("%Y-%m-%d")
	)
}

fn service_row(service: &ServiceRecord) -> String {
	format!(
		"{:<12} {:<12} {} {}",
		service.folio,
		service.status.label(),
		service.created_at.format("%Y-%m-%d"),
		service.description.as_deref().unwrap_or("")
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_transition_lines_include_ticket_warning() {
		let lines = transition_lines(Role::SuperAdmin, RecordStatus::Approved);
		assert_eq!(lines.len(), 2);
		assert!(lines[0].starts_with("Aprobada -> En progreso"));
		assert!(lines[0].contains(lifecycle::TICKET_GENERATION_WARNING));
		assert_eq!(lines[1], "Aprobada -> Cancelada");
	}

	#[test]
	fn test_transition_lines_when_role_has_no_actions() {
		let lines = transition_lines(Role::Admin, RecordStatus::Approved);
		assert_eq!(lines, vec!["Aprobada (admin): sin cambios disponibles"]);
	}

	#[test]
	fn test_transition_lines_for_terminal_status() {
		for role in [Role::SuperAdmin, Role::Admin] {
			for status in [RecordStatus::Completed, RecordStatus::Cancelled] {
				let lines = transition_lines(role, status);
				assert_eq!(lines.len(), 1);
				assert!(lines[0].ends_with("sin cambios disponibles"));
			}
		}
		assert_eq!(
			transition_lines(Role::SuperAdmin, RecordStatus::Completed),
			vec!["Completada (super_admin): sin cambios disponibles"]
		);
	}

	#[test]
	fn test_establishment_lines() {
		let found = vec![Establishment {
			id: "e-1".into(),
			name: "Sucursal Centro".into(),
			address: None,
			city: Some("Puebla".into()),
			client_id: None,
		}];
		assert_eq!(
			establishment_lines("centro", &found),
			vec!["e-1        Sucursal Centro Puebla"]
		);
		assert_eq!(
			establishment_lines(" norte ", &[]),
			vec!["Sin resultados para \"norte\""]
		);
		assert!(establishment_lines("  ", &[]).is_empty());
	}

	#[tokio::test]
	async fn test_load_cart_from_json() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("cart.json");
		std::fs::write(
			&path,
			r#"{
				"products": [
					{"id": "p-1", "name": "Refresco", "questions": [{"id": "q", "text": "Precio", "price": 20}]},
					{"id": "p-2", "name": "Galletas"}
				],
				"establishments": ["e-1"]
			}"#,
		)
		.unwrap();

		let cart = load_cart(&path).await.unwrap();
		assert_eq!(cart.product_count(), 2);
		assert_eq!(cart.calculate_total().to_string(), "65");
	}

	#[test]
	fn test_list_args_become_query() {
		let query = ListQuery::from(ListArgs {
			search: Some("COT".into()),
			status: Some(RecordStatus::Pending),
			from: NaiveDate::from_ymd_opt(2026, 1, 1),
			to: None,
			page: Some(2),
		});
		assert_eq!(
			query.to_pairs(),
			vec![
				("search", "COT".to_string()),
				("status", "pending".to_string()),
				("dateFrom", "2026-01-01".to_string()),
				("page", "2".to_string()),
			]
		);
	}
}
