use relax_gpu::prelude::*;
use spirv_std::arch::workgroup_memory_barrier_with_group_sync;

/// Width of the workgroup's illumination cache: 8x8 threads plus a one-pixel
/// border, enough for the first iteration's step size.
const TILE_SIZE: u32 = 10;
const TILE_LEN: usize = (TILE_SIZE * TILE_SIZE) as usize;

#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &AtrousPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)]
    specular_reprojection_confidence: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] scaled_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)] out_diffuse: TexRgba32,
) {
    let screen_pos = global_id.xy();

    if !Screen::new(params.resolution).contains(screen_pos) {
        return;
    }

    let out = Atrous {
        params,
        specular: &specular,
        diffuse: &diffuse,
        specular_reprojection_confidence: &specular_reprojection_confidence,
        history_length: &history_length,
        normal_roughness: &normal_roughness,
        scaled_view_z: &scaled_view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
    }
}

/// First iteration; same contract as [`main()`], but illumination is first
/// preloaded into workgroup memory.
#[spirv(compute(threads(8, 8)))]
#[allow(clippy::too_many_arguments)]
pub fn main_smem(
    #[spirv(global_invocation_id)] global_id: UVec3,
    #[spirv(workgroup_id)] workgroup_id: UVec3,
    #[spirv(local_invocation_index)] local_idx: u32,
    #[spirv(workgroup)] specular_tile: &mut [Vec4; TILE_LEN],
    #[spirv(workgroup)] diffuse_tile: &mut [Vec4; TILE_LEN],
    #[spirv(descriptor_set = 0, binding = 0, uniform)]
    params: &AtrousPassParams,
    #[spirv(descriptor_set = 1, binding = 0)] specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 1)] diffuse: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 2)]
    specular_reprojection_confidence: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 3)] history_length: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 4)] normal_roughness: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 5)] scaled_view_z: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 6)] out_specular: TexRgba32,
    #[spirv(descriptor_set = 1, binding = 7)] out_diffuse: TexRgba32,
) {
    let screen = Screen::new(params.resolution);
    let origin = workgroup_id.xy().as_ivec2() * 8 - ivec2(1, 1);
    let mut idx = local_idx;

    while (idx as usize) < TILE_LEN {
        let pos = origin
            + ivec2((idx % TILE_SIZE) as i32, (idx / TILE_SIZE) as i32);

        if screen.contains_signed(pos) {
            specular_tile[idx as usize] = specular.read(pos.as_uvec2());
            diffuse_tile[idx as usize] = diffuse.read(pos.as_uvec2());
        }

        idx += 64;
    }

    unsafe {
        workgroup_memory_barrier_with_group_sync();
    }

    let screen_pos = global_id.xy();

    if !screen.contains(screen_pos) {
        return;
    }

    let specular_tile = TileTex {
        tile: specular_tile,
        origin,
        fallback: specular,
    };

    let diffuse_tile = TileTex {
        tile: diffuse_tile,
        origin,
        fallback: diffuse,
    };

    let out = Atrous {
        params,
        specular: &specular_tile,
        diffuse: &diffuse_tile,
        specular_reprojection_confidence: &specular_reprojection_confidence,
        history_length: &history_length,
        normal_roughness: &normal_roughness,
        scaled_view_z: &scaled_view_z,
    }
    .run(screen_pos);

    unsafe {
        out_specular.write(screen_pos, out.specular);
        out_diffuse.write(screen_pos, out.diffuse);
    }
}

struct TileTex<'a> {
    tile: &'a [Vec4; TILE_LEN],
    origin: IVec2,
    fallback: TexRgba32<'a>,
}

impl TexRead for TileTex<'_> {
    fn load(&self, pos: UVec2) -> Vec4 {
        let local = pos.as_ivec2() - self.origin;

        if local.x >= 0
            && local.y >= 0
            && local.x < TILE_SIZE as i32
            && local.y < TILE_SIZE as i32
        {
            self.tile[(local.y as u32 * TILE_SIZE + local.x as u32) as usize]
        } else {
            self.fallback.read(pos)
        }
    }
}
