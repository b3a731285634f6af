//! Leads table walkthrough over the in-memory store.
//!
//! Run with: cargo run --example leads_page

use crmgrid_lib::api::InMemoryStore;
use crmgrid_lib::crm::leads;
use crmgrid_lib::edit::SubmitTrigger;
use crmgrid_lib::model::Record;
use crmgrid_lib::view::RowKey;

fn lead(id: i64, name: &str, company: &str, score: i64, status: &str) -> Record {
    Record::with_id(id)
        .set("name", name)
        .set("company", company)
        .set("email", format!("{}@example.com", name.to_lowercase()))
        .set("source", "Web")
        .set("score", score)
        .set("status", status)
}

fn print_page(session: &mut crmgrid_lib::TableSession<InMemoryStore>) {
    let page = session.page();
    for row in page.items() {
        let record = row.record();
        println!(
            "  {:>3}  {:<8} {:<10} {:>3}  {}",
            row.key().map(|k| k.to_string()).unwrap_or_default(),
            record.get("name").map(ToString::to_string).unwrap_or_default(),
            record.get("company").map(ToString::to_string).unwrap_or_default(),
            record.get("score").map(ToString::to_string).unwrap_or_default(),
            record.get("status").map(ToString::to_string).unwrap_or_default(),
        );
    }
    if let Some((start, end)) = page.meta.range() {
        println!("  Showing {} to {} of {}\n", start, end, page.meta.total_items);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryStore::new().with_collection(
        leads::COLLECTION,
        vec![
            lead(1, "Ada", "Engines", 72, "Qualified"),
            lead(2, "Grace", "Navy", 95, "Contacted"),
            lead(3, "Alan", "Bletchley", 64, "New"),
            lead(4, "Edsger", "Eindhoven", 81, "Qualified"),
            lead(5, "Barbara", "MIT", 58, "New"),
        ],
    );

    let mut session = leads::session(store)?;
    session.view_mut().set_page_size(3);
    session.refresh().await?;

    println!("Best leads first:");
    print_page(&mut session);

    session.view_mut().set_category("Qualified");
    println!("Qualified only:");
    print_page(&mut session);

    session.begin_edit(&RowKey::Primary(3.into()), "status")?;
    session.set_edit_input("Qualified")?;
    session.commit_edit(SubmitTrigger::AcceptKey).await?;
    println!("After qualifying Alan:");
    print_page(&mut session);

    Ok(())
}
