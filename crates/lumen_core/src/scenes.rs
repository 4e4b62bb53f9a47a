//! Built-in scenes used by the binary and by the renderer's tests.

use lumen_math::Vec3;

use crate::camera::Camera;
use crate::material::{Material, MaterialId};
use crate::mesh::Mesh;
use crate::scene::{Scene, SceneBuilder, SceneResult, Transform};
use crate::sky::Sky;

/// Names accepted by [`by_name`].
pub const SCENE_NAMES: &[&str] = &["closed_box", "cornell_box", "parallel_quads", "showcase"];

/// Look up a demo scene by name.
pub fn by_name(name: &str) -> Option<SceneResult<Scene>> {
    match name {
        "closed_box" => Some(closed_box(Vec3::ONE, Vec3::ONE)),
        "cornell_box" => Some(cornell_box()),
        "parallel_quads" => Some(parallel_quads(Vec3::ONE, Vec3::ONE)),
        "showcase" => Some(showcase()),
        _ => None,
    }
}

/// The six inward-facing walls of the box `[-1, 1]^3`.
///
/// `skip_front` leaves out the `+z` wall so a camera outside can look in.
fn add_box_walls(
    builder: &mut SceneBuilder,
    walls: [MaterialId; 6],
    skip_front: bool,
) -> SceneResult<()> {
    let [floor, ceiling, left, right, back, front] = walls;
    let e = 2.0;
    let quads = [
        ("floor", Vec3::new(-1.0, -1.0, -1.0), Vec3::Z * e, Vec3::X * e, floor),
        ("ceiling", Vec3::new(-1.0, 1.0, -1.0), Vec3::X * e, Vec3::Z * e, ceiling),
        ("left", Vec3::new(-1.0, -1.0, -1.0), Vec3::Y * e, Vec3::Z * e, left),
        ("right", Vec3::new(1.0, -1.0, -1.0), Vec3::Z * e, Vec3::Y * e, right),
        ("back", Vec3::new(-1.0, -1.0, -1.0), Vec3::X * e, Vec3::Y * e, back),
        ("front", Vec3::new(-1.0, -1.0, 1.0), Vec3::Y * e, Vec3::X * e, front),
    ];

    for (name, corner, u, v, material) in quads {
        if skip_front && name == "front" {
            continue;
        }
        builder.add_object(Mesh::quad(name, corner, u, v), material)?;
    }
    Ok(())
}

/// Small downward-facing light just under the ceiling of the unit box.
fn add_ceiling_light(builder: &mut SceneBuilder, emit: Vec3, half: f32) -> SceneResult<()> {
    let emit = builder.add_colour(emit);
    let light = builder.add_material(Material::DiffuseLight { emit });
    builder.add_object(
        Mesh::quad(
            "light",
            Vec3::new(-half, 0.99, -half),
            Vec3::new(2.0 * half, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0 * half),
        ),
        light,
    )?;
    Ok(())
}

/// Fully closed diffuse box with one light inside and the camera inside.
///
/// Nothing escapes, so with `albedo = 1` every path keeps bouncing until
/// the depth limit.
pub fn closed_box(albedo: Vec3, emit: Vec3) -> SceneResult<Scene> {
    let mut builder = SceneBuilder::new("closed_box");
    let albedo = builder.add_colour(albedo);
    let wall = builder.add_material(Material::Lambertian { albedo });

    add_box_walls(&mut builder, [wall; 6], false)?;
    add_ceiling_light(&mut builder, emit, 0.25)?;

    builder
        .camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 0.0, 0.9), Vec3::ZERO, Vec3::Y)
                .with_fov(70.0),
        )
        .sky(Sky::None);
    Ok(builder.build())
}

/// Classic red/green box with two blocks, open towards the camera.
pub fn cornell_box() -> SceneResult<Scene> {
    let mut builder = SceneBuilder::new("cornell_box");
    let white = builder.add_colour(Vec3::splat(0.73));
    let red = builder.add_colour(Vec3::new(0.65, 0.05, 0.05));
    let green = builder.add_colour(Vec3::new(0.12, 0.45, 0.15));

    let white = builder.add_material(Material::Lambertian { albedo: white });
    let red = builder.add_material(Material::Lambertian { albedo: red });
    let green = builder.add_material(Material::Lambertian { albedo: green });

    add_box_walls(&mut builder, [white, white, red, green, white, white], true)?;
    add_ceiling_light(&mut builder, Vec3::splat(15.0), 0.25)?;

    let block = builder.add_mesh(Mesh::cuboid(
        "block",
        Vec3::new(-0.3, 0.0, -0.3),
        Vec3::new(0.3, 1.2, 0.3),
    ))?;
    builder.add_instance(
        block,
        white,
        &Transform::from_translation(Vec3::new(-0.35, -1.0, -0.3)).with_rotation(Vec3::Y, 18.0),
    )?;
    builder.add_instance(
        block,
        white,
        &Transform::from_translation(Vec3::new(0.4, -1.0, 0.3))
            .with_rotation(Vec3::Y, -15.0)
            .with_scale(Vec3::new(1.0, 0.5, 1.0)),
    )?;

    builder
        .camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 0.0, 3.9), Vec3::ZERO, Vec3::Y)
                .with_fov(38.0),
        )
        .sky(Sky::None);
    Ok(builder.build())
}

/// Unit light quad at `y = 1` facing down onto a unit diffuse quad at
/// `y = 0` facing up. The camera sits between them looking straight down
/// at the centre of the receiver with a very narrow field of view.
///
/// The radiance seen at the receiver's centre is `albedo * emit * F`, with
/// `F ≈ 0.239456` the point-to-square form factor.
pub fn parallel_quads(albedo: Vec3, emit: Vec3) -> SceneResult<Scene> {
    let mut builder = SceneBuilder::new("parallel_quads");
    let albedo = builder.add_colour(albedo);
    let emit = builder.add_colour(emit);
    let receiver = builder.add_material(Material::Lambertian { albedo });
    let light = builder.add_material(Material::DiffuseLight { emit });

    builder.add_object(
        Mesh::quad("light", Vec3::new(-0.5, 1.0, -0.5), Vec3::X, Vec3::Z),
        light,
    )?;
    builder.add_object(
        Mesh::quad("receiver", Vec3::new(-0.5, 0.0, -0.5), Vec3::Z, Vec3::X),
        receiver,
    )?;

    builder
        .camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, Vec3::Z)
                .with_fov(1.0),
        )
        .sky(Sky::None);
    Ok(builder.build())
}

/// Checker floor, marble, metal and glass under a gradient sky.
pub fn showcase() -> SceneResult<Scene> {
    let mut builder = SceneBuilder::new("showcase");

    let dark = builder.add_colour(Vec3::new(0.2, 0.3, 0.1));
    let light = builder.add_colour(Vec3::splat(0.9));
    let checker = builder.add_checker(0.5, dark, light);
    let floor = builder.add_material(Material::Lambertian { albedo: checker });

    let marble = builder.add_noise(4.0);
    let marble = builder.add_material(Material::Lambertian { albedo: marble });

    let gold = builder.add_colour(Vec3::new(0.8, 0.6, 0.2));
    let fuzz = builder.add_colour(Vec3::splat(0.1));
    let metal = builder.add_material(Material::Metal { albedo: gold, fuzz });

    let glass = builder.add_material(Material::Dielectric {
        refraction_index: 1.5,
    });

    let warm = builder.add_colour(Vec3::new(6.0, 5.5, 5.0));
    let lamp = builder.add_material(Material::DiffuseLight { emit: warm });

    builder.add_object(
        Mesh::quad(
            "floor",
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::Z * 40.0,
            Vec3::X * 40.0,
        ),
        floor,
    )?;

    let sphere = builder.add_mesh(Mesh::uv_sphere("sphere", Vec3::ZERO, 1.0, 32, 64))?;
    for (x, material) in [(-2.2, marble), (0.0, glass), (2.2, metal)] {
        builder.add_instance(
            sphere,
            material,
            &Transform::from_translation(Vec3::new(x, 1.0, 0.0)),
        )?;
    }

    builder.add_object(
        Mesh::quad(
            "lamp",
            Vec3::new(-1.5, 4.0, -1.5),
            Vec3::X * 3.0,
            Vec3::Z * 3.0,
        ),
        lamp,
    )?;

    builder
        .camera(
            Camera::new()
                .with_position(Vec3::new(0.0, 2.5, 9.0), Vec3::new(0.0, 0.8, 0.0), Vec3::Y)
                .with_fov(35.0)
                .with_lens(9.0, 0.05),
        )
        .sky(Sky::VerticalGradient {
            factor: 1.0,
            top: [0.5, 0.7, 1.0],
            bottom: [1.0, 1.0, 1.0],
        });
    Ok(builder.build())
}
