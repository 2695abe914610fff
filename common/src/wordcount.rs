use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    error::ExecError,
    executor::{MapExecutor, ReduceExecutor},
    job::JobConfig,
    layout::FsLayout,
    task::TaskId,
};

/// Caracteres que se reemplazan por espacio antes de separar palabras.
const DELIMITERS: &[char] = &[
    ';', '.', ',', ':', '\'', '"', '[', ']', '{', '}', '(', ')', '!', '?', '#', '-', '_', '*',
];

/// Separadores de palabra: whitespace Unicode más los separadores de
/// información ASCII (`\x1c`..=`\x1f`), que `char::is_whitespace` no incluye.
fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Separa un texto en tokens normalizados (minúscula, sin delimitadores, sin vacíos).
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| if DELIMITERS.contains(&c) { ' ' } else { c })
        .collect();

    cleaned
        .split(is_word_separator)
        .map(|raw| raw.to_lowercase().trim().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Bucket de un token: código del primer carácter módulo `m`.
pub fn bucket_for(token: &str, m: u32) -> u32 {
    token.chars().next().map(|c| u32::from(c) % m).unwrap_or(0)
}

/// WordCount: map por primer carácter, reduce contando ocurrencias.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCount;

impl MapExecutor for WordCount {
    fn run_map(
        &self,
        map_id: TaskId,
        job: &JobConfig,
        layout: &FsLayout,
    ) -> Result<(), ExecError> {
        let input_path = layout.shard_path(map_id);
        let text = fs::read_to_string(&input_path).map_err(|e| ExecError::new(&input_path, e))?;

        // primero armamos todos los buckets en memoria, después escribimos
        let m = job.reduce_tasks();
        let mut buckets: Vec<String> = vec![String::new(); m as usize];
        for word in tokenize(&text) {
            let bucket = &mut buckets[bucket_for(&word, m) as usize];
            bucket.push_str(&word);
            bucket.push('\n');
        }

        for (bucket_id, content) in buckets.iter().enumerate() {
            if content.is_empty() {
                continue;
            }
            let path = layout.intermediate_path(map_id, bucket_id as TaskId);
            append_and_close(&path, content).map_err(|e| ExecError::new(&path, e))?;
        }

        Ok(())
    }
}

impl ReduceExecutor for WordCount {
    fn run_reduce(
        &self,
        bucket_id: TaskId,
        job: &JobConfig,
        layout: &FsLayout,
    ) -> Result<(), ExecError> {
        // orden de primera aparición: índice en `counts` por palabra
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, u64)> = Vec::new();

        for map_id in 0..job.map_tasks() {
            let path = layout.intermediate_path(map_id, bucket_id);
            let file = match File::open(&path) {
                Ok(f) => f,
                // ese map no produjo palabras para este bucket
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ExecError::new(&path, e)),
            };

            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| ExecError::new(&path, e))?;
                let word = line.trim();
                if word.is_empty() {
                    continue;
                }
                match index.get(word) {
                    Some(&i) => counts[i].1 += 1,
                    None => {
                        index.insert(word.to_string(), counts.len());
                        counts.push((word.to_string(), 1));
                    }
                }
            }
        }

        let output_path = layout.output_path(bucket_id);
        write_counts(&output_path, &counts).map_err(|e| ExecError::new(&output_path, e))
    }
}

fn append_and_close(path: &Path, content: &str) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    // sync antes de soltar el handle: el reporte al coordinator va después
    writer.get_ref().sync_all()
}

fn write_counts(path: &Path, counts: &[(String, u64)]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for (word, count) in counts {
        writeln!(writer, "{} {}", word, count)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_layout(sub: &str) -> FsLayout {
        let base: PathBuf = std::env::temp_dir().join("wordcount_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        let layout = FsLayout::new(&base);
        fs::create_dir_all(layout.shards_dir()).unwrap();
        fs::create_dir_all(layout.intermediate_dir()).unwrap();
        fs::create_dir_all(layout.output_dir()).unwrap();
        layout
    }

    #[test]
    fn tokenize_limpia_signos_y_mayusculas() {
        let tokens = tokenize("Hola, hola!! (mundo) well-known \"x\" *** _a_");
        assert_eq!(
            tokens,
            vec!["hola", "hola", "mundo", "well", "known", "x", "a"]
        );
    }

    #[test]
    fn tokenize_corta_en_separadores_de_informacion() {
        let tokens = tokenize("uno\u{1c}dos\u{1d}tres\u{1e}cuatro\u{1f}cinco\u{a0}seis");
        assert_eq!(tokens, vec!["uno", "dos", "tres", "cuatro", "cinco", "seis"]);
    }

    #[test]
    fn tokenize_de_texto_solo_con_signos_es_vacio() {
        assert!(tokenize(" ;.,:- ** ").is_empty());
    }

    #[test]
    fn bucket_usa_el_primer_caracter() {
        // 'a' = 97, 'b' = 98
        assert_eq!(bucket_for("apple", 2), 1);
        assert_eq!(bucket_for("banana", 2), 0);
        assert_eq!(bucket_for("cherry", 3), 0);
        assert_eq!(bucket_for("ñandú", 7), u32::from('ñ') % 7);
    }

    #[test]
    fn map_escribe_solo_buckets_no_vacios() {
        let layout = temp_layout("map_basic");
        let job = JobConfig::new(1, 2).unwrap();
        fs::write(layout.shard_path(0), "apple banana\nAvocado.").unwrap();

        WordCount.run_map(0, &job, &layout).unwrap();

        let b0 = fs::read_to_string(layout.intermediate_path(0, 0)).unwrap();
        let b1 = fs::read_to_string(layout.intermediate_path(0, 1)).unwrap();
        assert_eq!(b0, "banana\n");
        assert_eq!(b1, "apple\navocado\n");
    }

    #[test]
    fn map_sin_palabras_no_crea_intermedios() {
        let layout = temp_layout("map_empty");
        let job = JobConfig::new(1, 3).unwrap();
        fs::write(layout.shard_path(0), "  ... !!").unwrap();

        WordCount.run_map(0, &job, &layout).unwrap();

        for bucket in 0..3 {
            assert!(!layout.intermediate_path(0, bucket).exists());
        }
    }

    #[test]
    fn map_con_shard_inexistente_devuelve_error_con_ruta() {
        let layout = temp_layout("map_missing");
        let job = JobConfig::new(1, 1).unwrap();

        let err = WordCount.run_map(0, &job, &layout).unwrap_err();
        assert_eq!(err.path, layout.shard_path(0));
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn reduce_cuenta_en_orden_de_aparicion_y_tolera_faltantes() {
        let layout = temp_layout("reduce_basic");
        let job = JobConfig::new(3, 1).unwrap();
        fs::write(layout.intermediate_path(0, 0), "pera\nmanzana\npera\n").unwrap();
        // el map 1 no produjo nada para el bucket 0
        fs::write(layout.intermediate_path(2, 0), "uva\nmanzana\n").unwrap();

        WordCount.run_reduce(0, &job, &layout).unwrap();

        let content = fs::read_to_string(layout.output_path(0)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["pera 2", "manzana 2", "uva 1"]);
    }

    #[test]
    fn reduce_sobrescribe_salida_previa() {
        let layout = temp_layout("reduce_overwrite");
        let job = JobConfig::new(1, 1).unwrap();
        fs::write(layout.output_path(0), "basura 99\notra 1\n").unwrap();
        fs::write(layout.intermediate_path(0, 0), "sol\n").unwrap();

        WordCount.run_reduce(0, &job, &layout).unwrap();

        assert_eq!(fs::read_to_string(layout.output_path(0)).unwrap(), "sol 1\n");
    }

    #[test]
    fn reduce_sin_intermedios_deja_salida_vacia() {
        let layout = temp_layout("reduce_empty");
        let job = JobConfig::new(2, 2).unwrap();

        WordCount.run_reduce(1, &job, &layout).unwrap();

        let content = fs::read_to_string(layout.output_path(1)).unwrap();
        assert!(content.is_empty());
    }
}
