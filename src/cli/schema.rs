use crate::schema::SchemaVersion;

pub fn run_schema_show(version: Option<SchemaVersion>, json: bool) -> anyhow::Result<()> {
    let schema = version.unwrap_or_default().schema();

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!();
    println!(
        "Schema {} (root collection: {})",
        schema.version, schema.root_collection
    );
    println!();
    let width = schema
        .collections
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for collection in schema.collections {
        let unique: Vec<String> = schema
            .indexes_for(collection.name)
            .map(|idx| format!("{{{}}}", idx.keys.join(", ")))
            .collect();
        println!(
            "  {:<width$}  {:<15}  {}",
            collection.name,
            collection.category.as_str(),
            unique.join(" ")
        );
    }
    println!();

    Ok(())
}
