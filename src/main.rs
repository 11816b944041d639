use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tinyshelf::{
    bench, dataset, generator, Book, Config, DatasetKind, IndexType, Result, Shelf,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinyshelf", version, about = "Book catalogue over B-tree and AVL indexes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 生成随机与有序两份数据集
    Generate {
        #[arg(long, default_value_t = 5000)]
        size: usize,
        #[arg(long, default_value = "data")]
        dir: PathBuf,
        #[arg(long, default_value_t = generator::DEFAULT_SEED)]
        seed: u64,
    },
    /// 在两份数据集上对所有索引计时
    Bench {
        #[arg(long, default_value_t = 5000)]
        size: usize,
        #[arg(long, default_value = "data")]
        dir: PathBuf,
        #[arg(long, default_value_t = 2)]
        degree: usize,
    },
    /// 用几本书演示增删改查
    Demo {
        #[arg(long, default_value = "btree", value_parser = parse_index_type)]
        index: IndexType,
    },
}

fn parse_index_type(s: &str) -> std::result::Result<IndexType, String> {
    s.parse().map_err(|e: tinyshelf::ShelfError| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Generate { size, dir, seed } => generate(size, &dir, seed),
        Command::Bench { size, dir, degree } => run_bench(size, &dir, degree),
        Command::Demo { index } => demo(index),
    }
}

fn generate(size: usize, dir: &Path, seed: u64) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    for kind in [DatasetKind::Random, DatasetKind::Ordered] {
        let books = generator::generate_books(size, kind == DatasetKind::Ordered, seed);
        dataset::save(&dir.join(dataset::file_name(kind, size)), &books)?;
    }
    Ok(())
}

fn run_bench(size: usize, dir: &Path, degree: usize) -> Result<()> {
    // 提前拒绝非法的最小度数
    Config::default().set_min_degree(degree).build()?;

    for kind in [DatasetKind::Random, DatasetKind::Ordered] {
        let books = dataset::load(&dir.join(dataset::file_name(kind, size)))?;
        println!("===== {kind} books ({}) =====", books.len());
        for index_type in IndexType::ALL {
            println!("{}", bench::run(index_type, degree, &books));
        }
    }
    Ok(())
}

fn demo(index_type: IndexType) -> Result<()> {
    let mut shelf = Config::default().set_index_type(index_type).build()?;
    info!(index = %index_type, "running demo");

    shelf.load([
        Book::new("Programming Python", "Zhang San", "978-7-123-45678-9", "PHEI", 2020),
        Book::new("Data Structures", "Li Si", "978-7-123-45679-6", "HEP", 2019),
        Book::new("Introduction to Algorithms", "Wang Wu", "978-7-123-45680-2", "CMP", 2018),
        Book::new("Artificial Intelligence", "Zhao Liu", "978-7-123-45681-9", "TUP", 2021),
    ])?;
    print_listing("after insert", &shelf);

    println!("\nsearch 978-7-123-45679-6:\n{}", shelf.find("978-7-123-45679-6")?);

    shelf.update(Book::new(
        "Data Structures (2nd edition)",
        "Li Si",
        "978-7-123-45679-6",
        "HEP",
        2022,
    ))?;
    print_listing("after update", &shelf);

    shelf.remove("978-7-123-45680-2")?;
    print_listing("after delete", &shelf);
    Ok(())
}

fn print_listing(title: &str, shelf: &Shelf) {
    println!("\n{title}:");
    for line in shelf.listing() {
        println!("{line}");
    }
}
