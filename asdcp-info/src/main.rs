use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use asdcp::crypto::{AesDecContext, HmacContext};
use asdcp::report::{DescriptorReport, FileReport, TrackReader};
use asdcp::{EssenceType, FrameBuffer};
use clap::Parser;
use env_logger::Env;

#[derive(Parser)]
#[command(name = "asdcp-info", about = "Inspect AS-DCP MXF track files and extract their frames")]
struct Args {
    /// Input track file
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Input track file (positional)
    #[arg(conflicts_with = "file", required_unless_present_any = ["file", "schema", "version"])]
    input: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print JSON schema for the output format and exit
    #[arg(long)]
    schema: bool,

    /// Write essence frames into this directory
    #[arg(short = 'x', long = "extract")]
    extract: Option<PathBuf>,

    /// AES content key as 32 hex digits, for encrypted files
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// First frame to extract (0-based)
    #[arg(long, default_value_t = 0)]
    start: u32,

    /// Number of frames to extract (default: to the end of the file)
    #[arg(long)]
    count: Option<u32>,

    /// Display version and quit
    #[arg(long)]
    version: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reset SIGPIPE to default so piped output (e.g. head/tail) exits cleanly
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if args.version {
        asdcp::version::print_cli_version_banner(
            "AS-DCP Info Tool",
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(());
    }

    if args.schema {
        let schema = schemars::schema_for!(FileReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(file) = args.file.clone().or_else(|| args.input.clone()) else {
        return Err("file argument required".into());
    };
    let path = Path::new(&file);
    let mut track = TrackReader::open(path)?;
    let report = FileReport::from_track(path, &track)?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(dir) = &args.extract {
        let key = args.key.as_deref().map(parse_key).transpose()?;
        let written = extract_frames(&mut track, dir, key.as_ref(), args.start, args.count)?;
        log::info!("Extracted {written} frames into {}", dir.display());
    }

    Ok(())
}

fn print_report(report: &FileReport) {
    let asset = &report.asset;
    let writer = &report.writer;
    println!("File:               {}", report.path.display());
    println!("EssenceType:        {:?}", report.essence_type);
    println!("LabelSet:           {:?}", asset.label_set);
    println!("AssetUUID:          {}", asset.asset_uuid);
    println!("ProductName:        {}", writer.product_name);
    println!("ProductVersion:     {}", writer.product_version);
    println!("CompanyName:        {}", writer.company_name);
    println!("EditRate:           {}", asset.edit_rate);
    println!("SampleRate:         {}", asset.sample_rate);
    println!("Duration:           {}", asset.duration);
    if asset.encrypted {
        println!("Encrypted:          yes");
        if let Some(key_id) = asset.key_id {
            println!("CryptographicKeyID: {key_id}");
        }
        println!("HMAC:               {}", if asset.uses_hmac { "yes" } else { "no" });
    } else {
        println!("Encrypted:          no");
    }

    match &report.descriptor {
        DescriptorReport::Picture(p) | DescriptorReport::StereoPicture(p) => {
            println!("StoredSize:         {}x{}", p.stored_width, p.stored_height);
            println!("AspectRatio:        {}", p.aspect_ratio);
            println!("Rsize:              {}", p.rsize);
        }
        DescriptorReport::Video(v) => {
            println!("StoredSize:         {}x{}", v.stored_width, v.stored_height);
            println!("AspectRatio:        {}", v.aspect_ratio);
            println!("BitRate:            {}", v.bit_rate);
        }
        DescriptorReport::Audio(a) => {
            println!("AudioSamplingRate:  {}", a.audio_sampling_rate);
            println!("ChannelCount:       {}", a.channel_count);
            println!("QuantizationBits:   {}", a.quantization_bits);
            println!("ChannelFormat:      {}", a.channel_format.description());
        }
        DescriptorReport::Data(d) => {
            println!("DataEssenceCoding:  {}", d.data_essence_coding);
        }
        DescriptorReport::Atmos(a) => {
            println!("AtmosID:            {}", a.atmos_id);
            println!("FirstFrame:         {}", a.first_frame);
            println!("MaxChannelCount:    {}", a.max_channel_count);
            println!("MaxObjectCount:     {}", a.max_object_count);
        }
    }

    println!();
    println!(
        "{:>4} {:>12} {:>12} {:>12}",
        "SID", "OFFSET", "PREVIOUS", "FOOTER"
    );
    let partitions = std::iter::once(&report.header_partition)
        .chain(report.body_partition.iter())
        .chain(std::iter::once(&report.footer_partition));
    for p in partitions {
        println!(
            "{:>4} {:>12} {:>12} {:>12}",
            p.body_sid, p.this_partition, p.previous_partition, p.footer_partition
        );
    }

    println!();
    println!("Index: {} edit units, {} segments", report.index.duration, report.index.segments.len());
    for s in &report.index.segments {
        let kind = if s.edit_unit_byte_count > 0 { "CBR" } else { "VBR" };
        println!(
            "  {kind} start {:>8} duration {:>8} @ {}",
            s.index_start_position, s.index_duration, s.index_edit_rate
        );
    }
}

fn parse_key(hex: &str) -> Result<[u8; 16], String> {
    let hex = hex.trim();
    if hex.len() != 32 || !hex.is_ascii() {
        return Err(format!("key must be 32 hex digits, got {:?}", hex));
    }
    let mut key = [0u8; 16];
    for (i, b) in key.iter_mut().enumerate() {
        *b = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
            .map_err(|e| format!("bad key digit at {}: {e}", 2 * i))?;
    }
    Ok(key)
}

fn frame_extension(essence: EssenceType) -> &'static str {
    match essence {
        EssenceType::Jpeg2000 | EssenceType::Jpeg2000Stereo => "j2c",
        EssenceType::Mpeg2Ves => "m2v",
        EssenceType::Pcm24b48k | EssenceType::Pcm24b96k => "pcm",
        EssenceType::Atmos => "atmos",
        _ => "bin",
    }
}

/// Write frames to `dir`. Pictures and data get one file per frame; MPEG-2 and
/// PCM are streams and go into a single file.
fn extract_frames(
    track: &mut TrackReader,
    dir: &Path,
    key: Option<&[u8; 16]>,
    start: u32,
    count: Option<u32>,
) -> Result<u32, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;

    let info = track.essence_reader().info().clone();
    let mut dec = key.map(|k| AesDecContext::new(k)).transpose()?;
    let hmac = match key {
        Some(k) if info.uses_hmac => Some(HmacContext::new(k, info.label_set)?),
        _ => None,
    };
    if info.encrypted_essence && dec.is_none() {
        log::warn!("File is encrypted and no key was given; writing ciphertext");
    }

    let essence = track.essence_type();
    let ext = frame_extension(essence);
    let streamed = matches!(
        essence,
        EssenceType::Mpeg2Ves | EssenceType::Pcm24b48k | EssenceType::Pcm24b96k
    );
    let mut stream = if streamed {
        Some(BufWriter::new(File::create(dir.join(format!("essence.{ext}")))?))
    } else {
        None
    };

    let total = track.frame_count();
    let end = match count {
        Some(n) => start.saturating_add(n).min(total),
        None => total,
    };
    let mut buffers: Vec<FrameBuffer> = (0..track.buffers_per_frame())
        .map(|_| FrameBuffer::default())
        .collect();

    for frame in start..end {
        track.read_frame(frame, &mut buffers, dec.as_mut(), hmac.as_ref())?;
        if let Some(out) = stream.as_mut() {
            out.write_all(buffers[0].data())?;
            continue;
        }
        if buffers.len() == 2 {
            fs::write(dir.join(format!("frame_{frame:06}_L.{ext}")), buffers[0].data())?;
            fs::write(dir.join(format!("frame_{frame:06}_R.{ext}")), buffers[1].data())?;
        } else {
            fs::write(dir.join(format!("frame_{frame:06}.{ext}")), buffers[0].data())?;
        }
    }

    if let Some(mut out) = stream {
        out.flush()?;
    }
    Ok(end.saturating_sub(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        let key = parse_key("000102030405060708090a0b0c0d0e0F").unwrap();
        assert_eq!(key[0], 0);
        assert_eq!(key[15], 0x0f);
        assert!(parse_key("0001").is_err());
        assert!(parse_key("zz0102030405060708090a0b0c0d0e0f").is_err());
    }
}
