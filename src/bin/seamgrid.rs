// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

#[macro_use]
extern crate clap;
extern crate image;

use clap::{App, Arg, ArgMatches};
use log::info;
use seamgrid::{carve, Axis, EnergyMapOptions, GeneratorOptions, ImageLoader, Registries, SeamGenerator};

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("seamgrid")
        .version(crate_version!())
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Content-aware image resizing by batched seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to resize")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the result; the format follows the extension")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .takes_value(true)
                .conflicts_with("height")
                .help("Target width, carving vertical seams"),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .takes_value(true)
                .help("Target height, carving horizontal seams"),
        )
        .arg(
            Arg::with_name("axis")
                .long("axis")
                .takes_value(true)
                .possible_values(&["vertical", "horizontal"])
                .default_value("vertical")
                .help("Seam direction for --energy-map"),
        )
        .arg(
            Arg::with_name("algorithm")
                .long("algorithm")
                .takes_value(true)
                .default_value("sobel")
                .help("Energy map algorithm: sobel, dual, boundary-aware"),
        )
        .arg(
            Arg::with_name("generator")
                .long("generator")
                .takes_value(true)
                .default_value("random")
                .help("Seam strategy: random, predictive, full"),
        )
        .arg(
            Arg::with_name("mask")
                .long("mask")
                .takes_value(true)
                .help("An image the size of the input; brighter means keep"),
        )
        .arg(
            Arg::with_name("forward-weight")
                .long("forward-weight")
                .takes_value(true)
                .default_value("1.0")
                .help("Weight of the forward-energy term of the dual algorithm"),
        )
        .arg(
            Arg::with_name("batch-percentage")
                .long("batch-percentage")
                .takes_value(true)
                .default_value("0.05")
                .help("Fraction of the width removed per batch"),
        )
        .arg(
            Arg::with_name("min-batch")
                .long("min-batch")
                .takes_value(true)
                .default_value("10")
                .help("Smallest batch, when the image is wide enough"),
        )
        .arg(
            Arg::with_name("energy-map")
                .long("energy-map")
                .help("Write the energy map instead of carving"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("More logging; repeat for more still"),
        )
}

fn init_logging(matches: &ArgMatches) {
    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn options(matches: &ArgMatches, axis: Axis) -> GeneratorOptions {
    GeneratorOptions {
        generator: value_t_or_exit!(matches, "generator", String),
        axis,
        batch_percentage: value_t_or_exit!(matches, "batch-percentage", f64),
        min_batch_size: value_t_or_exit!(matches, "min-batch", u32),
        energy: EnergyMapOptions {
            algorithm: value_t_or_exit!(matches, "algorithm", String),
            forward_energy_weight: value_t_or_exit!(matches, "forward-weight", f64),
            ..EnergyMapOptions::default()
        },
    }
}

fn main() -> Result<(), failure::Error> {
    let matches = app().get_matches();
    init_logging(&matches);

    let (axis, target) = if matches.is_present("width") {
        (Axis::Vertical, Some(value_t!(matches, "width", u32)?))
    } else if matches.is_present("height") {
        (Axis::Horizontal, Some(value_t!(matches, "height", u32)?))
    } else {
        (value_t_or_exit!(matches, "axis", Axis), None)
    };

    let options = options(&matches, axis);
    let registries = Registries::register_all();
    let output = PathBuf::from(matches.value_of("output").unwrap_or_default());

    let loader = ImageLoader::new(PathBuf::from(matches.value_of("input").unwrap_or_default()), axis);
    let mask_loader = matches
        .value_of("mask")
        .map(|path| ImageLoader::new(PathBuf::from(path), axis));

    if matches.is_present("energy-map") {
        let image = loader.image()?;
        let mask = match &mask_loader {
            Some(mask_loader) => Some(mask_loader.mask()?),
            None => None,
        };
        let energy = registries.create_energy_map(&image, mask.as_ref(), axis, &options.energy)?;
        energy.to_image(None).save(&output)?;
        info!("wrote energy map to {}", output.display());
        return Ok(());
    }

    let target =
        target.ok_or_else(|| failure::err_msg("one of --width or --height is required"))?;
    let mut session =
        SeamGenerator::from_loader(&loader, mask_loader.as_ref(), &options, &registries)?;
    let image = loader.image()?;
    let (length, _) = axis.oriented(image.dimensions());
    let seams = if target < length { length - target } else { target - length };

    session.generate_seam_grid(seams)?;
    let carved = carve(&image, session.grid(), axis, target)?;
    carved.save(&output)?;
    info!(
        "wrote {}x{} image to {}",
        carved.width(),
        carved.height(),
        output.display()
    );
    Ok(())
}
