use anyhow::Result;

use crate::config::Config;
use crate::process_identification::tags::DynamicTagFile;

pub fn tag(config: &Config, entry: &str) -> Result<()> {
    let file = DynamicTagFile::new(&config.dynamic_tags_file);
    if file.add(entry)? {
        println!("Added {entry} to {}", file.path().display());
    } else {
        println!("{entry} is already tagged");
    }
    Ok(())
}

pub fn untag(config: &Config, entry: &str) -> Result<()> {
    let file = DynamicTagFile::new(&config.dynamic_tags_file);
    if file.remove(entry)? {
        println!("Removed {entry} from {}", file.path().display());
    } else {
        println!("{entry} was not tagged");
    }
    Ok(())
}
