use anyhow::Context;
use bookbuilding_notify::config::Config;
use bookbuilding_notify::store::ArrowStore;

fn main() -> anyhow::Result<()> {
    let config = Config::store_from_env().context("无法读取表配置")?;

    let path = ArrowStore::table_path(&config.data_dir, &config.store_region, &config.store_table);
    if ArrowStore::create_empty(&path)? {
        println!("成功创建空的表文件 {}", path.display());
    } else {
        println!("表文件已存在: {}", path.display());
    }
    Ok(())
}
