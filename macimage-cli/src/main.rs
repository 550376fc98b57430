use argh::FromArgs;
use env_logger::{Builder, Env, Target};
use image::{ImageFormat, RgbaImage};
use log::{info, warn};
use macimage::{
    decode_color_icon, decode_picture, decode_sprite_sheet, ResourceKind, SheetLayout,
};
use rayon::prelude::*;
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

type CliResult<T = ()> = Result<T, Box<dyn Error + Send + Sync>>;

/// Classic Mac OS image resource decoder.
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Pict(Pict),
    Cicn(Cicn),
    Rle(Rle),
    Batch(Batch),
}

/// Decodes a version 2 PICT resource.
#[derive(FromArgs)]
#[argh(subcommand, name = "pict")]
struct Pict {
    /// output format (png, bmp)
    #[argh(option, default = "Format::Png")]
    format: Format,

    /// the raw resource data
    #[argh(positional)]
    input: PathBuf,
    /// the output image
    #[argh(positional)]
    output: PathBuf,
}

/// Decodes a cicn color icon resource.
#[derive(FromArgs)]
#[argh(subcommand, name = "cicn")]
struct Cicn {
    /// output format (png, bmp)
    #[argh(option, default = "Format::Png")]
    format: Format,

    /// the raw resource data
    #[argh(positional)]
    input: PathBuf,
    /// the output image
    #[argh(positional)]
    output: PathBuf,
}

/// Decodes an rlëD sprite resource into a sprite sheet.
#[derive(FromArgs)]
#[argh(subcommand, name = "rle")]
struct Rle {
    /// output format (png, bmp)
    #[argh(option, default = "Format::Png")]
    format: Format,

    /// frames per sheet row. Picked from the frame count if not set.
    #[argh(option)]
    across: Option<u32>,

    /// also write every frame as its own image into this directory
    #[argh(option)]
    frames_dir: Option<PathBuf>,

    /// the raw resource data
    #[argh(positional)]
    input: PathBuf,
    /// the output sprite sheet
    #[argh(positional)]
    output: PathBuf,
}

/// Decodes every file in a directory as one kind of resource.
#[derive(FromArgs)]
#[argh(subcommand, name = "batch")]
struct Batch {
    /// resource kind of every input file (cicn, pict, rle)
    #[argh(option)]
    kind: ResourceKind,

    /// output format (png, bmp)
    #[argh(option, default = "Format::Png")]
    format: Format,

    /// directory of raw resource files
    #[argh(positional)]
    input_dir: PathBuf,
    /// directory the images are written to
    #[argh(positional)]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Png,
    Bmp,
}

impl Format {
    fn image_format(self) -> ImageFormat {
        match self {
            Format::Png => ImageFormat::Png,
            Format::Bmp => ImageFormat::Bmp,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Bmp => "bmp",
        }
    }
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(format) = s.eq_ignore_ascii_case("png").then_some(Format::Png)
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(Format::Bmp))
        else { return Err("expected png or bmp"); };

        Ok(format)
    }
}

fn main() -> CliResult {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    let Cli { command } = argh::from_env();

    match command {
        Command::Pict(Pict {
            format,
            input,
            output,
        }) => convert(ResourceKind::Picture, &input, &output, format),
        Command::Cicn(Cicn {
            format,
            input,
            output,
        }) => convert(ResourceKind::ColorIcon, &input, &output, format),
        Command::Rle(options) => rle(options),
        Command::Batch(options) => batch(options),
    }
}

fn save(image: &RgbaImage, output: &Path, format: Format) -> CliResult {
    image.save_with_format(output, format.image_format())?;
    info!(
        "Written {}x{} image to `{}`",
        image.width(),
        image.height(),
        output.display()
    );
    Ok(())
}

/// Decodes `input` as `kind` and writes the single resulting image.
fn convert(kind: ResourceKind, input: &Path, output: &Path, format: Format) -> CliResult {
    let data = fs::read(input)?;
    info!("Decoding {} `{}`", kind.os_type(), input.display());

    let image = match kind {
        ResourceKind::Picture => decode_picture(&data)?.ok_or("picture draws no pixels")?,
        ResourceKind::ColorIcon => decode_color_icon(&data)?,
        ResourceKind::Sprite => {
            let sprite = decode_sprite_sheet(&data, SheetLayout::auto())?;
            sprite.sheet.ok_or("sprite has no sheet")?.image
        }
    };

    save(&image, output, format)
}

fn rle(options: Rle) -> CliResult {
    let Rle {
        format,
        across,
        frames_dir,
        input,
        output,
    } = options;

    let data = fs::read(&input)?;
    info!("Decoding rlëD `{}`", input.display());

    let layout = SheetLayout {
        count_across: across,
    };
    let sprite = decode_sprite_sheet(&data, layout)?;

    if let Some(dir) = frames_dir {
        fs::create_dir_all(&dir)?;
        for (i, frame) in sprite.frames.iter().enumerate() {
            let path = dir.join(format!("{i:03}.{}", format.extension()));
            save(frame, &path, format)?;
        }
    }

    let sheet = sprite.sheet.ok_or("sprite has no sheet")?;
    info!(
        "{} frames laid out {} across, {} down",
        sprite.frames.len(),
        sheet.count_across,
        sheet.count_down
    );
    save(&sheet.image, &output, format)
}

fn batch(options: Batch) -> CliResult {
    let Batch {
        kind,
        format,
        input_dir,
        output_dir,
    } = options;

    fs::create_dir_all(&output_dir)?;

    let inputs = fs::read_dir(&input_dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    let inputs: Vec<_> = inputs.into_iter().filter(|path| path.is_file()).collect();

    // resources are independent; each worker owns its input buffer
    let failed = inputs
        .par_iter()
        .filter(|input| {
            let Some(stem) = input.file_stem() else {
                return true;
            };
            let mut output = output_dir.join(stem);
            output.set_extension(format.extension());

            match convert(kind, input, &output, format) {
                Ok(()) => false,
                Err(e) => {
                    warn!("Failed to decode `{}`: {e}", input.display());
                    true
                }
            }
        })
        .count();

    info!("Decoded {} of {} files", inputs.len() - failed, inputs.len());

    if failed > 0 {
        return Err(format!("{failed} files failed to decode").into());
    }
    Ok(())
}
