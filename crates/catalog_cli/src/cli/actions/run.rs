use super::{Action, GlobalArgs};
use anyhow::{Context, Result};
use catalog_core::db::{migrations::current_user_version, open_db};
use catalog_core::{
    ActorId, AllowAll, CategoryService, CategoryTreeNode, DeleteRequest, MoveRequest,
    SqliteCatalogStore,
};
use log::info;
use rusqlite::Connection;

// Local tooling runs as the site administrator; the gate grants everything.
const LOCAL_ACTOR: ActorId = 0;

type LocalService<'conn> = CategoryService<SqliteCatalogStore<'conn>, AllowAll>;

pub fn execute(action: Action) -> Result<()> {
    match action {
        Action::Init(globals) => {
            let conn = open(&globals)?;
            let version = current_user_version(&conn)?;
            println!(
                "catalog ready at {} (schema v{version})",
                globals.db.display()
            );
        }
        Action::AddCategory {
            globals,
            parent,
            name,
        } => {
            let conn = open(&globals)?;
            let category = service(&conn, &globals)?
                .create_category(LOCAL_ACTOR, parent, name)
                .context("failed to create category")?;
            println!(
                "created category {} `{}` under {} (sort order {})",
                category.id, category.name, category.parent, category.sort_order
            );
        }
        Action::AddCourse {
            globals,
            category,
            full_name,
            short_name,
        } => {
            let conn = open(&globals)?;
            let course = service(&conn, &globals)?
                .create_course(LOCAL_ACTOR, category, full_name, short_name)
                .context("failed to create course")?;
            println!(
                "created course {} `{}` in category {} (sort order {})",
                course.id, course.short_name, course.category, course.sort_order
            );
        }
        Action::Tree { globals, json } => {
            let conn = open(&globals)?;
            let service = service(&conn, &globals)?;
            let forest = service
                .category_tree(LOCAL_ACTOR)
                .context("failed to load categories")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&forest)?);
                return Ok(());
            }
            if forest.is_empty() {
                println!("(no categories)");
            }
            for node in &forest {
                print_node(&service, node, 0)?;
            }
        }
        Action::List {
            globals,
            query,
            json,
        } => {
            let conn = open(&globals)?;
            let page = service(&conn, &globals)?
                .list_categories(LOCAL_ACTOR, query)
                .context("failed to list categories")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            for category in &page.items {
                println!(
                    "[{}] {} (parent {}, sort {}{})",
                    category.id,
                    category.name,
                    category.parent,
                    category.sort_order,
                    if category.visible { "" } else { ", hidden" }
                );
            }
            println!(
                "page {} ({} per page), {} matching categories",
                page.page, page.limit, page.total
            );
        }
        Action::Delete {
            globals,
            ids,
            move_to,
        } => {
            let conn = open(&globals)?;
            let mut request = DeleteRequest::new(ids);
            if let Some(target) = move_to {
                request = request.moving_content_to(target);
            }
            let outcome = service(&conn, &globals)?
                .delete_categories(LOCAL_ACTOR, request)
                .context("failed to delete categories")?;
            info!(
                "event=cli_delete module=cli status=ok deleted={} categories_relocated={} courses_relocated={}",
                outcome.deleted.len(),
                outcome.categories_relocated,
                outcome.courses_relocated
            );
            println!(
                "deleted {} categories; moved {} categories and {} courses",
                outcome.deleted.len(),
                outcome.categories_relocated,
                outcome.courses_relocated
            );
        }
        Action::Move {
            globals,
            id,
            before,
            parent,
        } => {
            let conn = open(&globals)?;
            let mut request = MoveRequest::toward(id, before);
            if let Some(parent) = parent {
                request = request.under(parent);
            }
            let outcome = service(&conn, &globals)?
                .move_category(LOCAL_ACTOR, request)
                .with_context(|| format!("failed to move category {id}"))?;
            info!(
                "event=cli_move module=cli status=ok category_id={} categories_renumbered={} courses_renumbered={}",
                outcome.category_id, outcome.categories_renumbered, outcome.courses_renumbered
            );
            println!("{outcome}");
            println!(
                "renumbered {} categories and {} courses",
                outcome.categories_renumbered, outcome.courses_renumbered
            );
        }
    }

    Ok(())
}

fn open(globals: &GlobalArgs) -> Result<Connection> {
    open_db(&globals.db)
        .with_context(|| format!("failed to open {}", globals.db.display()))
}

fn service<'conn>(conn: &'conn Connection, globals: &GlobalArgs) -> Result<LocalService<'conn>> {
    let store = SqliteCatalogStore::try_new(conn).context("catalog schema is not ready")?;
    let service = CategoryService::new(store, AllowAll, globals.config)?;
    Ok(service)
}

fn print_node(service: &LocalService<'_>, node: &CategoryTreeNode, level: usize) -> Result<()> {
    let indent = "  ".repeat(level);
    let category = &node.category;
    println!(
        "{indent}[{}] {} (sort {})",
        category.id, category.name, category.sort_order
    );
    let courses = service
        .list_courses(LOCAL_ACTOR, category.id)
        .with_context(|| {
            format!("failed to list courses of category {}", category.id)
        })?;
    for course in courses {
        println!(
            "{indent}    - {} {} (sort {})",
            course.short_name, course.full_name, course.sort_order
        );
    }
    for child in &node.children {
        print_node(service, child, level + 1)?;
    }
    Ok(())
}
