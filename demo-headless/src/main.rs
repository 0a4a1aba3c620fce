use aspect_core::{
    aspect, is_missing, AspectOptions, ChunkLayout, DevicePolicy, ElevationRaster, Grid,
    ProcessingMode, Storage, FLAT,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Synthetic terrain to evaluate
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Surface {
    /// Single peak in the middle of the map
    Cone,
    /// Tilted plane rising towards the given direction
    Plane,
    /// East-west ridge with a valley either side
    Ridge,
    /// Constant elevation
    Flat,
}

/// Where the elevation grid lives
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageArg {
    Host,
    Device,
    Chunked,
}

/// Terrain aspect demo on a synthetic elevation grid
#[derive(Parser, Debug)]
#[command(name = "aspect-demo")]
#[command(about = "Compute terrain aspect for a synthetic surface", long_about = None)]
struct Args {
    /// Grid rows
    #[arg(long, default_value_t = 256)]
    rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = 256)]
    cols: usize,

    /// Surface shape
    #[arg(short, long, value_enum, default_value_t = Surface::Cone)]
    surface: Surface,

    /// Uphill direction of the plane surface in degrees (0=North, 90=East)
    #[arg(long, default_value_t = 45.0)]
    uphill: f64,

    /// Storage kind of the input raster
    #[arg(long, value_enum, default_value_t = StorageArg::Host)]
    storage: StorageArg,

    /// Rows per chunk for chunked storage
    #[arg(long, default_value_t = 64)]
    chunk_rows: usize,

    /// Columns per chunk for chunked storage
    #[arg(long, default_value_t = 64)]
    chunk_cols: usize,

    /// Evaluate chunks one after another instead of in parallel
    #[arg(long)]
    sequential_chunks: bool,

    /// Run the device kernel on host threads when no GPU is available
    #[arg(long)]
    allow_host: bool,
}

fn synthesize(args: &Args) -> Grid {
    let mid_row = args.rows as f64 / 2.0;
    let mid_col = args.cols as f64 / 2.0;
    let (sin, cos) = args.uphill.to_radians().sin_cos();

    Grid::from_fn(args.rows, args.cols, |r, c| {
        let dr = r as f64 - mid_row;
        let dc = c as f64 - mid_col;
        match args.surface {
            Surface::Cone => 1000.0 - 5.0 * (dr * dr + dc * dc).sqrt(),
            // Rows grow southward, so north is -dr
            Surface::Plane => 500.0 + 2.0 * (cos * -dr + sin * dc),
            Surface::Ridge => 800.0 - 0.05 * dr * dr,
            Surface::Flat => 100.0,
        }
    })
}

/// Counts per 45 degree compass sector plus flat and missing cells
#[derive(Default)]
struct Summary {
    sectors: [usize; 8],
    flat: usize,
    missing: usize,
}

const SECTOR_NAMES: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

impl Summary {
    fn collect(grid: &Grid) -> Self {
        let mut summary = Self::default();
        for &value in grid.as_slice() {
            if is_missing(value) {
                summary.missing += 1;
            } else if value == FLAT {
                summary.flat += 1;
            } else {
                let sector = ((value + 22.5) / 45.0) as usize % 8;
                summary.sectors[sector] += 1;
            }
        }
        summary
    }

    fn print(&self) {
        let total: usize = self.sectors.iter().sum::<usize>() + self.flat + self.missing;
        println!("Facing | Cells    | Share");
        println!("-------|----------|-------");
        for (name, &count) in SECTOR_NAMES.iter().zip(&self.sectors) {
            println!("{:6} | {:8} | {:5.1}%", name, count, percent(count, total));
        }
        println!("{:6} | {:8} | {:5.1}%", "flat", self.flat, percent(self.flat, total));
        println!(
            "{:6} | {:8} | {:5.1}%",
            "none",
            self.missing,
            percent(self.missing, total)
        );
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    println!("=== Terrain Aspect Demo ===\n");
    println!(
        "Surface: {:?}, {}x{} cells, storage: {:?}",
        args.surface, args.rows, args.cols, args.storage
    );

    let storage = match args.storage {
        StorageArg::Host => Storage::Host,
        StorageArg::Device => Storage::Device,
        StorageArg::Chunked => match ChunkLayout::new(args.chunk_rows, args.chunk_cols) {
            Ok(layout) => Storage::Chunked(layout),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        },
    };

    let options = AspectOptions::default()
        .with_device_policy(if args.allow_host {
            DevicePolicy::AllowHost
        } else {
            DevicePolicy::RequireGpu
        })
        .with_chunk_mode(if args.sequential_chunks {
            ProcessingMode::Sequential
        } else {
            ProcessingMode::Parallel
        });

    let dem = ElevationRaster::new(synthesize(&args))
        .with_name("elevation")
        .with_attr("units", "m")
        .with_storage(storage);

    let start = std::time::Instant::now();
    let result = match aspect(&dem, &options) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    println!(
        "Computed '{}' in {:.2} ms\n",
        result.name(),
        elapsed.as_secs_f64() * 1000.0
    );
    Summary::collect(result.data()).print();
}
