use anyhow::{Context, Result};
use common::FsLayout;
use glob::glob;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};
use tracing::{info, warn};

/// Deja `temp/`, `intermediate/` y `out/` vacíos bajo la raíz del layout.
/// Con `keep_shards` no toca `temp/` (reusar shards ya generados).
pub fn prepare_workspace(layout: &FsLayout, keep_shards: bool) -> Result<()> {
    let mut dirs = vec![layout.intermediate_dir(), layout.output_dir()];
    if keep_shards {
        fs::create_dir_all(layout.shards_dir())
            .with_context(|| format!("no se pudo crear {}", layout.shards_dir().display()))?;
    } else {
        dirs.push(layout.shards_dir());
    }

    for dir in dirs {
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("no se pudo borrar {}", dir.display()))?;
        }
        fs::create_dir_all(&dir).with_context(|| format!("no se pudo crear {}", dir.display()))?;
    }
    info!("workspace listo en {}", layout.root().display());
    Ok(())
}

/// Junta las líneas de todos los `*.txt` de `input_dir` (orden alfabético) y
/// las reparte en `n` shards `temp/<i>.txt`. Cada shard lleva `total / n`
/// líneas y los primeros `total % n` una más. Devuelve el total de líneas.
pub fn split_inputs(input_dir: &Path, n: u32, layout: &FsLayout) -> Result<usize> {
    // el directorio se escapa: sólo `*.txt` es patrón
    let escaped = glob::Pattern::escape(&input_dir.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.txt").to_string_lossy().into_owned();

    let mut lines: Vec<String> = Vec::new();
    let mut files = 0usize;
    for entry in glob(&pattern).with_context(|| format!("patrón inválido {}", pattern))? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        lines.extend(text.lines().map(str::to_string));
        files += 1;
    }

    if files == 0 {
        warn!("no hay archivos .txt en {}, los shards quedan vacíos", input_dir.display());
    }

    let total = lines.len();
    let n = n as usize;
    let per_shard = total / n;
    let remainder = total % n;

    let mut start = 0;
    for shard in 0..n {
        let count = per_shard + usize::from(shard < remainder);
        let end = start + count;

        let path = layout.shard_path(shard as u32);
        let file = fs::File::create(&path)
            .with_context(|| format!("no se pudo crear {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for line in &lines[start..end] {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        start = end;
    }

    info!(
        "{} líneas de {} archivos repartidas en {} shards",
        total, files, n
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(sub: &str) -> PathBuf {
        let base = std::env::temp_dir().join("coordinator_bootstrap_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    #[test]
    fn prepare_workspace_borra_restos_de_corridas_anteriores() {
        let base = temp_dir("prepare");
        let layout = FsLayout::new(&base);
        fs::create_dir_all(layout.intermediate_dir()).unwrap();
        fs::write(layout.intermediate_path(0, 0), "viejo\n").unwrap();
        fs::create_dir_all(layout.shards_dir()).unwrap();
        fs::write(layout.shard_path(0), "shard viejo\n").unwrap();

        prepare_workspace(&layout, false).unwrap();

        assert!(layout.output_dir().is_dir());
        assert!(!layout.intermediate_path(0, 0).exists());
        assert!(!layout.shard_path(0).exists());
    }

    #[test]
    fn prepare_workspace_puede_conservar_shards() {
        let base = temp_dir("prepare_keep");
        let layout = FsLayout::new(&base);
        fs::create_dir_all(layout.shards_dir()).unwrap();
        fs::write(layout.shard_path(0), "hola\n").unwrap();

        prepare_workspace(&layout, true).unwrap();

        assert_eq!(fs::read_to_string(layout.shard_path(0)).unwrap(), "hola\n");
        assert!(layout.intermediate_dir().is_dir());
    }

    #[test]
    fn split_reparte_el_resto_en_los_primeros_shards() {
        let base = temp_dir("split");
        let inputs = base.join("inputs");
        fs::create_dir_all(&inputs).unwrap();
        fs::write(inputs.join("a.txt"), "l1\nl2\nl3").unwrap();
        fs::write(inputs.join("b.txt"), "l4\nl5\n").unwrap();
        fs::write(inputs.join("ignorado.md"), "no\n").unwrap();

        let layout = FsLayout::new(base.join("work"));
        prepare_workspace(&layout, false).unwrap();

        let total = split_inputs(&inputs, 2, &layout).unwrap();
        assert_eq!(total, 5);
        assert_eq!(fs::read_to_string(layout.shard_path(0)).unwrap(), "l1\nl2\nl3\n");
        assert_eq!(fs::read_to_string(layout.shard_path(1)).unwrap(), "l4\nl5\n");
    }

    #[test]
    fn split_sin_entradas_crea_shards_vacios() {
        let base = temp_dir("split_empty");
        let inputs = base.join("inputs");
        fs::create_dir_all(&inputs).unwrap();

        let layout = FsLayout::new(base.join("work"));
        prepare_workspace(&layout, false).unwrap();

        assert_eq!(split_inputs(&inputs, 3, &layout).unwrap(), 0);
        for shard in 0..3 {
            assert_eq!(fs::read_to_string(layout.shard_path(shard)).unwrap(), "");
        }
    }
}
