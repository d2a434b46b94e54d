use std::fmt::Write as _;
use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use time::OffsetDateTime;

use crate::api::{AdvisoryValidation, CatalogApi};
use crate::app::state::{
    delete_prompt, SubmitFailure, CREATED_MESSAGE, DELETED_MESSAGE, PERSIST_FAILED_MESSAGE,
    UPDATED_MESSAGE,
};
use crate::app::{ActionDispatcher, App};
use crate::catalog::{
    filter_products, CatalogFilter, CategoryFilter, FieldErrors, Product, ProductDraft, ProductId,
};
use crate::ui::format::{category_icon, format_brl, format_date, format_stock, is_new};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only products whose title contains this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
    /// Todas, Fruta, Legume or Verdura
    #[arg(long, short, default_value = "Todas")]
    pub category: CategoryFilter,
    /// Limit the number of products printed
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub titulo: String,
    /// Price; a comma is accepted as decimal separator
    #[arg(long)]
    pub preco: String,
    #[arg(long, default_value = "Fruta")]
    pub categoria: String,
    #[arg(long)]
    pub descricao: Option<String>,
    #[arg(long)]
    pub estoque: Option<String>,
    /// Creation date sent as-is (e.g. 2024-05-01)
    #[arg(long)]
    pub data_criacao: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Product identifier
    pub id: String,
    #[arg(long)]
    pub titulo: Option<String>,
    #[arg(long)]
    pub preco: Option<String>,
    #[arg(long)]
    pub categoria: Option<String>,
    #[arg(long)]
    pub descricao: Option<String>,
    /// Stock; pass an empty string to clear it
    #[arg(long)]
    pub estoque: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Product identifier
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn list_products(api: &dyn CatalogApi, args: ListArgs) -> Result<()> {
    let output = run_list(api, &args, OffsetDateTime::now_utc())?;
    print!("{output}");
    Ok(())
}

pub fn add_product(api: &dyn CatalogApi, validation: AdvisoryValidation, args: AddArgs) -> Result<()> {
    let output = run_add(api, validation, args)?;
    print!("{output}");
    Ok(())
}

pub fn edit_product(
    api: &dyn CatalogApi,
    validation: AdvisoryValidation,
    args: EditArgs,
) -> Result<()> {
    let output = run_edit(api, validation, args)?;
    print!("{output}");
    Ok(())
}

pub fn delete_product(api: &dyn CatalogApi, args: DeleteArgs) -> Result<()> {
    let output = run_delete(api, &args, &mut confirm_on_terminal)?;
    print!("{output}");
    Ok(())
}

fn run_list(api: &dyn CatalogApi, args: &ListArgs, now: OffsetDateTime) -> Result<String> {
    let dispatcher = ActionDispatcher::new(api, AdvisoryValidation::default());
    let products = dispatcher
        .load_products()
        .context("Não foi possível carregar os produtos")?;
    let filter = CatalogFilter {
        search: args.search.clone().unwrap_or_default(),
        category: args.category,
    };
    let visible = filter_products(&products, &filter);
    if visible.is_empty() {
        return Ok("Nenhum produto cadastrado ainda\n".to_string());
    }

    let mut out = String::new();
    for product in visible.iter().take(args.limit) {
        let mut headline = format!(
            "#{}  {} {}",
            product.id,
            category_icon(&product.categoria),
            product.titulo
        );
        if is_new(product, now) {
            headline.push_str("  [Novo]");
        }
        let _ = writeln!(&mut out, "{headline}");
        let _ = writeln!(
            &mut out,
            "    {} • {} • estoque {} • criado em {}",
            product.categoria,
            format_brl(product.preco),
            format_stock(product.estoque),
            format_date(product.created_at())
        );
    }
    if visible.len() > args.limit {
        let _ = writeln!(&mut out, "... e mais {}", visible.len() - args.limit);
    }
    Ok(out)
}

fn run_add(api: &dyn CatalogApi, validation: AdvisoryValidation, args: AddArgs) -> Result<String> {
    let draft = ProductDraft {
        titulo: args.titulo,
        descricao: args.descricao.unwrap_or_default(),
        preco: args.preco,
        categoria: args.categoria,
        estoque: args.estoque.unwrap_or_default(),
        data_criacao: args.data_criacao.unwrap_or_default(),
    };
    let product = submit(api, validation, &draft, None)?;
    Ok(format!("{CREATED_MESSAGE} #{} {}\n", product.id, product.titulo))
}

fn run_edit(api: &dyn CatalogApi, validation: AdvisoryValidation, args: EditArgs) -> Result<String> {
    let current = find_product(api, &args.id)?;
    let mut draft = ProductDraft::from_product(&current);
    let overrides = [
        (&mut draft.titulo, args.titulo),
        (&mut draft.preco, args.preco),
        (&mut draft.categoria, args.categoria),
        (&mut draft.descricao, args.descricao),
        (&mut draft.estoque, args.estoque),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }
    let product = submit(api, validation, &draft, Some(&current.id))?;
    Ok(format!("{UPDATED_MESSAGE} #{} {}\n", product.id, product.titulo))
}

fn run_delete(
    api: &dyn CatalogApi,
    args: &DeleteArgs,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<String> {
    let product = find_product(api, &args.id)?;
    if !args.yes && !confirm(&delete_prompt(&product.titulo))? {
        return Ok("Exclusão cancelada.\n".to_string());
    }
    let dispatcher = ActionDispatcher::new(api, AdvisoryValidation::default());
    dispatcher
        .delete(&product.id)
        .context("Erro ao excluir produto")?;
    Ok(format!("{DELETED_MESSAGE} #{}\n", product.id))
}

fn submit(
    api: &dyn CatalogApi,
    validation: AdvisoryValidation,
    draft: &ProductDraft,
    editing: Option<&ProductId>,
) -> Result<Product> {
    let payload = draft
        .to_payload()
        .map_err(|errors| anyhow!("dados inválidos:\n{}", describe_field_errors(&errors)))?;
    ActionDispatcher::new(api, validation)
        .submit(&payload, editing)
        .map_err(|failure| match failure {
            SubmitFailure::Rejected(errors) => {
                let lines: Vec<String> = errors.iter().map(|e| format!("  - {e}")).collect();
                anyhow!("o servidor rejeitou o produto:\n{}", lines.join("\n"))
            }
            SubmitFailure::Failed { detail } => anyhow!("{PERSIST_FAILED_MESSAGE} ({detail})"),
        })
}

fn find_product(api: &dyn CatalogApi, id: &str) -> Result<Product> {
    let id = id.trim();
    let products = api
        .list_products()
        .context("Não foi possível carregar os produtos")?;
    products
        .into_iter()
        .find(|product| product.id.to_string() == id)
        .ok_or_else(|| anyhow!("produto #{id} não encontrado"))
}

fn describe_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  - {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirm_on_terminal(question: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("stdin is not a terminal; pass --yes to delete without confirmation");
    }
    let answer = prompt(&format!("{question} [s/N]"))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes"))
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label} ")?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}
