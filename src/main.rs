use std::{env, sync::Arc};

use anyhow::{Context, bail};
use log::{debug, info};

use pagebloom::{
    bloom::{
        BloomBlock, BloomBlockQuerier, BloomOffset, BloomQuerier, DEFAULT_MAX_PAGE_SIZE, FileBlock,
        IterOptions, LazyBloomIter,
    },
    buffer::BufferPool,
};

const USAGE: &str = "usage: pagebloom <block-file> [<page> <byte-offset>]";

fn options_from_env() -> anyhow::Result<IterOptions> {
    let max_page_size = match env::var("PAGEBLOOM_MAX_PAGE_SIZE") {
        Ok(v) => v
            .parse()
            .with_context(|| format!("PAGEBLOOM_MAX_PAGE_SIZE is not a size: {v}"))?,
        Err(_) => DEFAULT_MAX_PAGE_SIZE,
    };
    let use_pool = env::var("PAGEBLOOM_POOL").is_ok_and(|v| v == "1" || v == "true");
    Ok(IterOptions {
        use_pool,
        max_page_size,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = options_from_env()?;
    debug!("Cursor options: {:?}", options);

    let (path, target) = match args.as_slice() {
        [path] => (path, None),
        [path, page, offset] => {
            let page = page.parse().context("page must be a number")?;
            let offset = offset.parse().context("byte offset must be a number")?;
            (path, Some(BloomOffset::new(page, offset)))
        }
        _ => bail!(USAGE),
    };

    let pool = Arc::new(BufferPool::default());
    let block = FileBlock::open(path, pool.clone())
        .with_context(|| format!("Failed to open block {path}"))?;

    match target {
        Some(offset) => {
            let mut querier = BloomBlockQuerier::new(&block, options);
            let bloom = querier.seek(offset)?;
            println!("{}\t{} bytes", bloom.offset(), bloom.len());
        }
        None => {
            let mut iter = LazyBloomIter::with_options(&block, options);
            let mut count = 0usize;
            while iter.next() {
                if let Some(bloom) = iter.at() {
                    println!("{}\t{} bytes", bloom.offset(), bloom.len());
                    count += 1;
                }
            }
            if let Some(err) = iter.err() {
                return Err(err).context("Scan failed");
            }
            info!("Read {} blooms from {} pages", count, block.page_count());
        }
    }

    let metrics = block.metrics().snapshot();
    debug!(
        "Metrics: {:?}, pool hits {} misses {}",
        metrics,
        pool.hits(),
        pool.misses()
    );
    Ok(())
}
